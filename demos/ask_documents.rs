use dotenv::dotenv;
use model_lever::*;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::result::Result;

fn bundle_path() -> Result<PathBuf, Box<dyn Error>> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MODEL_LEVER_BUNDLE").ok())
        .map(PathBuf::from)
        .ok_or_else(|| "pass the extracted bundle path or set MODEL_LEVER_BUNDLE".into())
}

fn selection_from_env() -> Result<(ModelSelection, ProcessingApproach), Box<dyn Error>> {
    let provider = std::env::var("MODEL_LEVER_PROVIDER").unwrap_or_else(|_| "Ollama".to_string());
    let model = std::env::var("MODEL_LEVER_MODEL").unwrap_or_else(|_| "llava:latest".to_string());
    let approach = match std::env::var("MODEL_LEVER_APPROACH") {
        Ok(label) => label.parse()?,
        Err(_) => ProcessingApproach::default(),
    };
    Ok((ModelSelection::parse(&provider, model)?, approach))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let config = PipelineConfig::from_env();
    let lever = ModelLever::from_config(&config)?;
    let (selection, approach) = selection_from_env()?;

    println!(
        "📄 Summarizing with {} ({}), approach {:?}...\n",
        selection.model, selection.provider, approach
    );
    let mut ctx = PipelineContext::new(selection, approach);

    let content = load_extracted_content(&bundle_path()?).await?;
    let summaries = lever.index_content(&mut ctx, &content).await?;
    println!("✅ Indexed {} summaries.\n", summaries.total_len());

    println!("🤖 Ready! Ask questions about your document (type 'quit' to exit).");
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let question = input.trim();

        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            break;
        }

        if question.is_empty() {
            continue;
        }

        println!("\nThinking...");

        match lever.ask(&ctx, question).await {
            Ok(answer) => {
                println!("\n{}\n", answer);
                println!("------------------------------------------------------------------");
            }
            Err(e) => {
                eprintln!("❌ Error: {}", e);
            }
        }
    }

    Ok(())
}
