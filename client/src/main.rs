use clap::Parser;
use client::command::{Input, Prompt, HELP};
use client::connection::{Connection, MessageReader};
use client::display::render;
use log::{error, info};
use shared::{ClientCommand, ServerMessage, DEFAULT_HOST, DEFAULT_PORT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT))]
    server: String,
}

/// Forwards server messages to the main loop. A frame read must not be
/// cancelled halfway, so it runs on its own task instead of inside `select!`.
fn spawn_receiver(mut reader: MessageReader) -> mpsc::UnboundedReceiver<ServerMessage> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match reader.recv().await {
                Ok(Some(message)) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Error receiving message: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    client::logger(env_logger::Env::default()).init();

    let args = Args::parse();

    let connection = Connection::connect(&args.server).await?;
    let (reader, mut writer) = connection.into_split();
    let mut messages = spawn_receiver(reader);

    let mut prompt = Prompt::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);

    loop {
        tokio::select! {
            message = messages.recv() => {
                let Some(message) = message else {
                    println!("server closed the connection");
                    break;
                };
                prompt.observe(&message);
                println!("{}", render(&message));
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input, leaving");
                    writer.send(&ClientCommand::Exit).await?;
                    break;
                };

                match prompt.parse(&line) {
                    Ok(Input::Send(command)) => {
                        let exiting = command == ClientCommand::Exit;
                        writer.send(&command).await?;
                        if exiting {
                            break;
                        }
                    }
                    Ok(Input::Help) => println!("{}", HELP),
                    Ok(Input::Nothing) => {}
                    Err(e) => println!("! {}", e),
                }
            }
        }
    }

    Ok(())
}
