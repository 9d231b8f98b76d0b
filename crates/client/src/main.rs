mod crawl;
mod images;
mod save;
mod target;

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use bytes::Bytes;
use clap::{Parser, ValueEnum};
use ferry_http::client::{ClientConfig, DEFAULT_MAX_REDIRECTS, HttpClient};
use ferry_http::codec::LineDecoder;
use ferry_http::protocol::{Payload, ReasonPhrase};
use futures::StreamExt;
use http::header::CONTENT_TYPE;
use http::{Method, Response};
use tokio_util::codec::FramedRead;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

use crate::target::Target;

#[derive(Parser, Debug)]
#[command(name = "ferry-client")]
#[command(about = "Sends one HTTP/1.1 request and saves what comes back", long_about = None)]
struct Cli {
    #[arg(value_enum, ignore_case = true)]
    method: Command,

    /// Resource to request, e.g. `example.com/index.html`
    uri: String,

    /// Port to connect to, overrides the port of the URI
    port: Option<u16>,

    /// Directory fetched pages and images are saved in
    #[arg(long, default_value = "files")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
    max_redirects: usize,

    /// How many pages deep embedded images are followed
    #[arg(long, default_value_t = 5)]
    max_depth: usize,

    /// Give up on a response that stalls for this many seconds
    #[arg(long)]
    read_timeout: Option<u64>,

    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Command {
    #[value(name = "HEAD")]
    Head,
    #[value(name = "GET")]
    Get,
    #[value(name = "POST")]
    Post,
    #[value(name = "PUT")]
    Put,
}

impl From<Command> for Method {
    fn from(command: Command) -> Self {
        match command {
            Command::Head => Method::HEAD,
            Command::Get => Method::GET,
            Command::Post => Method::POST,
            Command::Put => Method::PUT,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: can't install logger: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "request failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let target = Target::parse(&cli.uri, cli.port)?;

    let payload = match cli.method {
        Command::Post | Command::Put => Some(Payload::text(read_message().await?)),
        Command::Head | Command::Get => None,
    };

    let config = ClientConfig::new()
        .with_max_redirects(cli.max_redirects)
        .with_read_timeout(cli.read_timeout.map(Duration::from_secs));
    let mut client = HttpClient::new(target.host.clone(), target.port, config);

    let response = client.send_request(cli.method.into(), &target.path, payload).await?;
    print!("{}", render_response(&response));

    if cli.method == Command::Get && response.body().is_some() {
        crawl::save_and_crawl(&mut client, &cli.output_dir, &target.path, response, cli.max_depth).await;
    }

    Ok(())
}

/// Reads the message body of a POST or PUT from the first line of stdin.
async fn read_message() -> Result<String, ferry_http::protocol::ParseError> {
    eprintln!("Please enter your message:");
    let mut lines = FramedRead::new(tokio::io::stdin(), LineDecoder);
    Ok(lines.next().await.transpose()?.unwrap_or_default())
}

/// The status line, header block and body of a response as they are printed.
/// Bodies that are not text are summarized by their size.
fn render_response(response: &Response<Option<Bytes>>) -> String {
    let reason = match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => reason.as_str(),
        None => response.status().canonical_reason().unwrap_or_default(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{:?} {} {}", response.version(), response.status().as_str(), reason);
    for (name, value) in response.headers() {
        let _ = writeln!(out, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    out.push('\n');

    if let Some(body) = response.body() {
        let is_text = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .is_some_and(|content_type| content_type.type_() == mime::TEXT);

        if is_text {
            out.push_str(&String::from_utf8_lossy(body));
            out.push('\n');
        } else {
            let _ = writeln!(out, "<{} bytes of binary data>", body.len());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn cli_arguments() {
        let cli = Cli::try_parse_from(["ferry-client", "get", "localhost/index.html", "8000"]).unwrap();

        assert_eq!(cli.method, Command::Get);
        assert_eq!(cli.uri, "localhost/index.html");
        assert_eq!(cli.port, Some(8000));
        assert_eq!(cli.output_dir, PathBuf::from("files"));
        assert_eq!(cli.max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!(Cli::try_parse_from(["ferry-client", "DELETE", "localhost"]).is_err());
    }

    #[test]
    fn render_text_response() {
        let mut response = Response::builder()
            .header("content-type", "text/html")
            .header("content-length", "11")
            .body(Some(Bytes::from_static(b"<h1>Hi</h1>")))
            .unwrap();
        response.extensions_mut().insert(ReasonPhrase::new("OK"));

        assert_eq!(
            render_response(&response),
            indoc! {"
                HTTP/1.1 200 OK
                content-type: text/html
                content-length: 11

                <h1>Hi</h1>
            "}
        );
    }

    #[test]
    fn render_binary_and_empty_responses() {
        let response = Response::builder()
            .header("content-type", "image/png")
            .body(Some(Bytes::from_static(b"\x89PNG")))
            .unwrap();
        assert!(render_response(&response).ends_with("\n\n<4 bytes of binary data>\n"));

        let response = Response::builder().status(304).body(None).unwrap();
        assert_eq!(render_response(&response), "HTTP/1.1 304 Not Modified\n\n");
    }
}
