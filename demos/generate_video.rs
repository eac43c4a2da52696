use genstudio::{
    cancel_pair, codec, logger, ClientContext, CredentialStore, ImageRole, Studio, StudioConfig,
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
    let Some(prompt) = args.next() else {
        eprintln!("usage: generate_video <prompt> [first-frame image] [output.mp4]");
        std::process::exit(2);
    };
    let first_frame = args.next();
    let output_path = args.next().unwrap_or_else(|| "generated.mp4".to_string());

    let config = StudioConfig::from_env();
    let store = CredentialStore::from_config(&config);
    let mut studio = Studio::connect(ClientContext::from_store(config, &store))?;

    let controller = studio.controller_mut(TaskKind::TextToVideo);
    controller.inputs_mut().prompt = prompt;
    if let Some(path) = first_frame {
        let image = codec::encode_file(&path).await?;
        controller
            .inputs_mut()
            .set_image(ImageRole::Primary, Some(image));
    }

    // Ctrl-C stops polling instead of killing the process mid-write.
    let (cancel, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    match controller.submit_with(&signal).await.and_then(|output| output.video()) {
        Some(video) => {
            video.save_to(&output_path).await?;
            println!("{} -> {}", video.url(), output_path);
        }
        None => {
            eprintln!("{}", controller.error().unwrap_or("No video returned"));
            std::process::exit(1);
        }
    }

    controller.clear_output();
    Ok(())
}
