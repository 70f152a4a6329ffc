use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spiceserver::job::StructuredInput;
use spiceserver::netlist::Netlister;
use spiceserver::types::Flavour;

/// One call to [`FakeNetlister::write_sim`].
#[derive(Debug, Clone)]
pub struct NetlistCall {
    pub input: StructuredInput,
    pub flavour: Flavour,
    pub output_dir: PathBuf,
}

/// A fake netlister that writes a fixed set of files and records every call.
///
/// Cloning shares the call log.
#[derive(Debug, Clone, Default)]
pub struct FakeNetlister {
    files: Vec<(String, String)>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<NetlistCall>>>,
}

impl FakeNetlister {
    /// Writes `files` (relative path, contents) on every call and reports
    /// them in order.
    pub fn writing(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, contents)| (path.to_string(), contents.to_string()))
                .collect(),
            delay: None,
            calls: Arc::default(),
        }
    }

    /// Sleep for `delay` before writing anything, like a slow netlister.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Produces nothing, i.e. always fails to convert.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NetlistCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Netlister for FakeNetlister {
    fn write_sim<'a>(
        &'a self,
        input: &'a StructuredInput,
        flavour: Flavour,
        output_dir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Vec<PathBuf>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(NetlistCall {
                input: input.clone(),
                flavour,
                output_dir: output_dir.to_path_buf(),
            });

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let mut generated = Vec::new();
            for (path, contents) in &self.files {
                tokio::fs::write(output_dir.join(path), contents)
                    .await
                    .expect("fake netlister write");
                generated.push(PathBuf::from(path));
            }
            generated
        })
    }
}
