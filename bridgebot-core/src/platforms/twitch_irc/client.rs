//! Low-level TLS IRC client for Twitch chat. Handles the wire protocol only;
//! the runtime layer turns raw lines into chat events.

use tokio::io::{split, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tokio_native_tls::native_tls;
use tokio_native_tls::TlsConnector;
use tracing::{debug, error, info};

use crate::Error;

const TWITCH_IRC_HOST: &str = "irc.chat.twitch.tv";
const TWITCH_IRC_PORT: u16 = 6697;

/// One parsed IRC line: `[@tags] [:prefix] COMMAND params [:trailing]`.
#[derive(Debug, Clone)]
pub struct IrcLine {
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl IrcLine {
    pub fn parse(line: &str) -> Self {
        let mut rest = line.trim();
        let mut tags = None;
        let mut prefix = None;
        let mut command = String::new();
        let mut params = Vec::new();
        let mut trailing = None;

        if rest.starts_with('@') {
            match rest.find(' ') {
                Some(pos) => {
                    tags = Some(rest[..pos].to_string());
                    rest = &rest[pos + 1..];
                }
                None => {
                    return Self {
                        tags: Some(rest.to_string()),
                        prefix,
                        command,
                        params,
                        trailing,
                    }
                }
            }
        }

        if rest.starts_with(':') {
            match rest.find(' ') {
                Some(pos) => {
                    prefix = Some(rest[..pos].trim_start_matches(':').to_string());
                    rest = &rest[pos + 1..];
                }
                None => {
                    return Self {
                        tags,
                        prefix: Some(rest.trim_start_matches(':').to_string()),
                        command,
                        params,
                        trailing,
                    }
                }
            }
        }

        let mut parts = rest.splitn(2, ' ');
        if let Some(cmd) = parts.next() {
            command = cmd.to_uppercase();
        }
        rest = parts.next().unwrap_or("");

        if let Some(idx) = rest.find(" :") {
            trailing = Some(rest[idx + 2..].to_string());
            let before = rest[..idx].trim();
            if !before.is_empty() {
                params.extend(before.split_whitespace().map(String::from));
            }
        } else if rest.starts_with(':') {
            trailing = Some(rest[1..].to_string());
        } else {
            params.extend(rest.split_whitespace().map(String::from));
        }

        Self {
            tags,
            prefix,
            command,
            params,
            trailing,
        }
    }

    /// Value of one `key=value` pair from the tag string.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        let tags = self.tags.as_deref()?;
        tags.trim_start_matches('@')
            .split(';')
            .find_map(|kv| kv.strip_prefix(key)?.strip_prefix('='))
    }

    /// Nick portion of the `nick!user@host` prefix.
    pub fn prefix_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split('!').next().unwrap_or(prefix))
    }
}

/// TLS connection to Twitch IRC with a writer task and a reader task. PINGs
/// are answered in the reader; everything else flows out of `incoming`.
pub struct IrcClient {
    outgoing: mpsc::UnboundedSender<String>,
    pub incoming: Option<mpsc::UnboundedReceiver<IrcLine>>,
    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl IrcClient {
    pub async fn connect(username: &str, oauth_token: &str) -> Result<Self, Error> {
        let tcp = TcpStream::connect((TWITCH_IRC_HOST, TWITCH_IRC_PORT)).await?;
        let connector = native_tls::TlsConnector::new()
            .map_err(|e| Error::Platform(format!("TLS connector init failed: {e}")))?;
        let connector = TlsConnector::from(connector);
        let tls_stream = connector
            .connect(TWITCH_IRC_HOST, tcp)
            .await
            .map_err(|e| Error::Platform(format!("TLS handshake with twitch failed: {e}")))?;

        let (read_half, write_half) = split(tls_stream);
        let (tx_outgoing, rx_outgoing) = mpsc::unbounded_channel::<String>();
        let (tx_incoming, rx_incoming) = mpsc::unbounded_channel::<IrcLine>();

        let write_task = tokio::spawn(Self::writer_loop(write_half, rx_outgoing));

        tx_outgoing.send(format!("PASS {oauth_token}")).ok();
        tx_outgoing.send(format!("NICK {username}")).ok();
        tx_outgoing
            .send("CAP REQ :twitch.tv/commands twitch.tv/tags twitch.tv/membership".to_string())
            .ok();

        let read_task = tokio::spawn(Self::reader_loop(read_half, tx_incoming, tx_outgoing.clone()));

        Ok(Self {
            outgoing: tx_outgoing,
            incoming: Some(rx_incoming),
            read_task,
            write_task,
        })
    }

    async fn reader_loop<R>(
        read_half: R,
        tx_incoming: mpsc::UnboundedSender<IrcLine>,
        tx_outgoing: mpsc::UnboundedSender<String>,
    ) where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(read_half);
        let mut buffer = String::new();

        loop {
            buffer.clear();
            match reader.read_line(&mut buffer).await {
                Ok(0) => {
                    info!("twitch irc: server closed the connection");
                    break;
                }
                Ok(_) => {
                    let line = buffer.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("<< {line}");

                    let parsed = IrcLine::parse(line);
                    if parsed.command == "PING" {
                        if let Some(trail) = &parsed.trailing {
                            tx_outgoing.send(format!("PONG :{trail}")).ok();
                        }
                        continue;
                    }
                    if tx_incoming.send(parsed).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("twitch irc read error: {e:?}");
                    break;
                }
            }
        }
        info!("twitch irc reader loop ended");
    }

    async fn writer_loop<W>(mut write_half: W, mut rx_outgoing: mpsc::UnboundedReceiver<String>)
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(&mut write_half);
        while let Some(line) = rx_outgoing.recv().await {
            debug!(">> {line}");
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\r\n").await.is_err()
                || writer.flush().await.is_err()
            {
                error!("twitch irc write error, stopping writer");
                break;
            }
        }
        info!("twitch irc writer loop ended");
    }

    pub fn send_raw_line(&self, line: &str) {
        let _ = self.outgoing.send(line.to_string());
    }

    pub fn join_channel(&self, channel: &str) {
        self.send_raw_line(&format!("JOIN #{channel}"));
    }

    pub fn part_channel(&self, channel: &str) {
        self.send_raw_line(&format!("PART #{channel}"));
    }

    pub fn send_privmsg(&self, channel: &str, message: &str) {
        self.send_raw_line(&format!("PRIVMSG #{channel} :{message}"));
    }

    pub fn shutdown(&self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_privmsg() {
        let raw = "@badges=broadcaster/1;display-name=Streamer;mod=0;user-id=123 \
                   :streamer!streamer@streamer.tmi.twitch.tv PRIVMSG #streamer :!ping hello";
        let line = IrcLine::parse(raw);
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.params, vec!["#streamer"]);
        assert_eq!(line.trailing.as_deref(), Some("!ping hello"));
        assert_eq!(line.tag_value("user-id"), Some("123"));
        assert_eq!(line.tag_value("display-name"), Some("Streamer"));
        assert_eq!(line.tag_value("badges"), Some("broadcaster/1"));
        assert_eq!(line.prefix_nick(), Some("streamer"));
    }

    #[test]
    fn parses_ping() {
        let line = IrcLine::parse("PING :tmi.twitch.tv");
        assert_eq!(line.command, "PING");
        assert_eq!(line.trailing.as_deref(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn missing_tag_is_none() {
        let line = IrcLine::parse("@mod=1 :a!a@a PRIVMSG #c :hi");
        assert_eq!(line.tag_value("user-id"), None);
        assert_eq!(line.tag_value("mod"), Some("1"));
    }
}
