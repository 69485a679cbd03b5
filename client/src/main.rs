use clap::Parser;
use client::{resolve_server, ClientConfig, ClientSession, RetryPolicy, SessionObserver};
use log::info;
use shared::{Day, WeatherRecord};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Seconds to wait for each reply before resending
    #[arg(short = 't', long, default_value = "5")]
    timeout_secs: u64,

    /// Resends after the first attempt
    #[arg(short = 'r', long, default_value = "5")]
    retries: u32,

    /// Receive buffer size in bytes
    #[arg(short = 'b', long, default_value_t = shared::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,
}

/// Prints session events to the terminal
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_cities_updated(&self, names: &[String]) {
        if names.is_empty() {
            println!("Cities: (no items to show)");
        } else {
            println!("Cities: {}", names.join(", "));
        }
    }

    fn on_city_selected(&self, record: &WeatherRecord) {
        println!("== {} ==", record.name());
    }

    fn on_status_message(&self, text: &str) {
        println!("{}", text);
    }

    fn on_connection_usable(&self, usable: bool) {
        if !usable {
            println!("(offline)");
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Refresh,
    City(String),
    Fetch(String),
    Day(Day),
    Server(String),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let argument = |what: &str| {
            if rest.is_empty() {
                Err(format!("usage: {} <{}>", word, what))
            } else {
                Ok(rest.to_string())
            }
        };

        match word {
            "list" => Ok(Command::List),
            "refresh" => Ok(Command::Refresh),
            "city" => argument("name").map(Command::City),
            "fetch" => argument("name").map(Command::Fetch),
            "today" => Ok(Command::Day(Day::Today)),
            "tomorrow" => Ok(Command::Day(Day::Tomorrow)),
            "in2days" => Ok(Command::Day(Day::In2Days)),
            "server" => argument("host:port").map(Command::Server),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command {:?}, try `help`", other)),
        }
    }
}

const HELP: &str = "\
commands:
  list               ask the server for its city list
  refresh            ask the server to reload its data, then relist
  city <name>        request a city's weather without waiting
  fetch <name>       request a city's weather and wait for it
  today | tomorrow | in2days
                     show the forecast for that day
  server <host:port> switch to another server
  quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ClientConfig {
        server_addr: resolve_server(&args.server).await?,
        retry: RetryPolicy::new(Duration::from_secs(args.timeout_secs), args.retries),
        buffer_size: args.buffer_size,
    };

    info!("Starting client...");
    let session = ClientSession::connect(&config, Arc::new(ConsoleObserver)).await?;
    let policy = session.retry_policy();

    if let Err(e) = session
        .request_city_list(policy.timeout, policy.max_retries)
        .await
    {
        println!("Error: cannot receive cities list from server ({}).", e);
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::List => {
                if let Err(e) = session
                    .request_city_list(policy.timeout, policy.max_retries)
                    .await
                {
                    println!("Could not reach server: {}", e);
                }
            }
            Command::Refresh => {
                if let Err(e) = session
                    .refresh_then_relist(policy.timeout, policy.max_retries)
                    .await
                {
                    println!("Could not connect to given server ({}).", e);
                }
            }
            Command::City(name) => {
                if let Err(e) = session.request_city(&name).await {
                    println!("{}", e);
                }
            }
            Command::Fetch(name) => {
                if let Err(e) = session
                    .fetch_city(&name, policy.timeout, policy.max_retries)
                    .await
                {
                    println!("{}", e);
                }
            }
            Command::Day(day) => {
                if session.select_day(day).await.is_none() {
                    println!("Select a city to see the forecast for {}", day.label());
                }
            }
            Command::Server(addr) => match resolve_server(&addr).await {
                Ok(server_addr) => {
                    let _ = session.reconnect(server_addr).await;
                }
                Err(e) => println!("Could not connect to given server ({}).", e),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    Ok(())
}
