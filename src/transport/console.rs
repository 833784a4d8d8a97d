use super::traits::{Activity, Outbound};
use std::future::Future;
use std::pin::Pin;
use tokio::io::AsyncWriteExt;

/// Writes replies to stdout, one line per message. Used by the CLI.
pub struct ConsoleOutbound {
    prefix: String,
}

impl ConsoleOutbound {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Outbound for ConsoleOutbound {
    fn name(&self) -> &str {
        "console"
    }

    fn send<'a>(
        &'a self,
        _activity: &'a Activity,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("{}{text}\n", self.prefix).as_bytes())
                .await?;
            stdout.flush().await?;
            Ok(())
        })
    }
}
