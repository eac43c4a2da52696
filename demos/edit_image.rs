use genstudio::{
    codec, logger, AspectRatio, ClientContext, CredentialStore, ImageRole, Studio, StudioConfig,
    TaskKind,
};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }
    logger::init_with_config(logger::LoggerConfig::development())?;

    let mut args = env::args().skip(1);
    let (Some(input), Some(prompt)) = (args.next(), args.next()) else {
        eprintln!("usage: edit_image <image> <instruction> [output] [ratio]");
        std::process::exit(2);
    };
    let output_path = args.next();
    let ratio: AspectRatio = match args.next() {
        Some(raw) => raw.parse()?,
        None => AspectRatio::Square,
    };

    let config = StudioConfig::from_env();
    let store = CredentialStore::from_config(&config);
    if let Ok(key) = env::var("GEMINI_API_KEY") {
        if !store.is_set() {
            store.set(&key);
        }
    }
    let mut studio = Studio::connect(ClientContext::from_store(config, &store))?;

    let image = codec::encode_file(&input).await?;
    let controller = studio.controller_mut(TaskKind::Edit);
    let inputs = controller.inputs_mut();
    inputs.prompt = prompt;
    inputs.aspect_ratio = Some(ratio);
    inputs.set_image(ImageRole::Primary, Some(image));

    match controller.submit().await {
        Some(output) => {
            if let Some(text) = output.text() {
                println!("{}", text);
            }
            match output.image() {
                Some(image) => {
                    let path = output_path.unwrap_or_else(|| {
                        format!("edited.{}", codec::file_extension_for(&image.content_type))
                    });
                    codec::save_attachment(image, &path).await?;
                    println!("Saved {}", path);
                }
                None => log::warn!("No image in the response"),
            }
        }
        None => {
            eprintln!("{}", controller.error().unwrap_or("Unknown error"));
            std::process::exit(1);
        }
    }

    Ok(())
}
