use rust_bot::{config::Config, logger, websocket, console, console::DebugCommand};
use std::{env, error::Error, process::ExitCode};
use futures::future::pending;
use tokio::sync::mpsc;

struct Args {
	username: String,
	bot_to_join: Option<String>,
}

impl Args {
	fn parse(args: &[String]) -> Option<Self> {
		let (command, rest) = args.split_first()?;
		if command != "run" {
			return None;
		}

		let (username, rest) = rest.split_first()?;
		Some(Self { username: username.clone(), bot_to_join: rest.first().cloned() })
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let _ = logger::init();
	let raw_args = env::args().collect::<Vec<String>>();

	let Some(Args { username, bot_to_join }) = Args::parse(&raw_args[1..]) else {
		eprintln!("Usage: run <username> [bot_to_join]");
		return ExitCode::FAILURE;
	};

	match run(username, bot_to_join).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{e}");
			ExitCode::FAILURE
		}
	}
}

async fn run(username: String, bot_to_join: Option<String>) -> Result<(), Box<dyn Error>> {
	let _ = dotenvy::dotenv();

	let config = Config::load("config.json")?;
	let password = config.password_for(&username)
		.ok_or_else(|| format!("no password configured for {username}"))?;

	let (http_scheme, _, host) = config.host();
	let params = [("username", username), ("password", password), ("version", "bot".to_string())];

	let client = reqwest::Client::new();
	let response = client.post(format!("{http_scheme}://{host}/login"))
		.header("Content-Type", "application/x-www-form-urlencoded")
		.form(&params)
		.send()
		.await?;

	let cookie = response.headers().get("set-cookie").ok_or("login did not return a session cookie")?.to_str()?;

	let (debug_sender, debug_receiver) = mpsc::unbounded_channel::<DebugCommand>();
	console::spawn_console(debug_sender);

	if let Some(bot_name) = bot_to_join {
		log::info!("Will attempt to join a table hosted by {bot_name}.");
	}

	websocket::connect(cookie, debug_receiver, config).await?;

	pending::<()>().await;
	Ok(())
}
