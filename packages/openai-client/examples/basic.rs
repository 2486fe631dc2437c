//! Basic OpenAI client usage example

use openai_client::{ChatRequest, ImageRequest, Message, OpenAIClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment
    let client = OpenAIClient::from_env()?;

    // Simple chat completion
    println!("=== Chat Completion ===");
    let response = client
        .chat_completion(
            ChatRequest::new("gpt-4o-mini")
                .message(Message::system("You are a helpful assistant."))
                .message(Message::user("What is Rust in one sentence?"))
                .temperature(0.7)
                .max_tokens(100),
        )
        .await?;

    println!("Response: {}", response.content().unwrap_or("<empty>"));

    // JSON-object mode
    println!("\n=== JSON Mode ===");
    let json = client
        .chat_text(
            ChatRequest::new("gpt-4o-mini")
                .message(Message::user(
                    "Return a JSON object with fields `language` and `year` for Rust.",
                ))
                .json_object(),
        )
        .await?;
    println!("JSON: {json}");

    // Image generation
    println!("\n=== Image Generation ===");
    let image = client
        .generate_image(ImageRequest::new("a lighthouse at dusk, photorealistic"))
        .await?;
    println!("URL: {:?}", image.data.first().and_then(|d| d.url.as_deref()));

    Ok(())
}
