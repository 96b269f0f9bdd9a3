//! Renderer that writes each resolved pass as one JSON document.

use std::io::Write;

use serde::Serialize;
use tracing::error;

use signalbar_core::{ClusterRenderState, Renderer};

/// One output record.
#[derive(Serialize)]
struct RenderRecord<'a> {
    pass: u64,
    content_descriptions: Vec<&'a str>,
    state: &'a ClusterRenderState,
}

/// Writes one JSON document per pass.
///
/// Compact output is one line per pass; `pretty` output is indented and
/// separated by a newline.
pub struct JsonRenderer<W: Write + Send> {
    out: W,
    pretty: bool,
    passes: u64,
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        Self {
            out,
            pretty,
            passes: 0,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(&mut self, state: &ClusterRenderState) -> anyhow::Result<()> {
        let record = RenderRecord {
            pass: self.passes,
            content_descriptions: state.content_descriptions().collect(),
            state,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, &record)?;
        } else {
            serde_json::to_writer(&mut self.out, &record)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Renderer for JsonRenderer<W> {
    fn render(&mut self, state: &ClusterRenderState) {
        self.passes += 1;
        if let Err(e) = self.write_record(state) {
            error!("Failed to write render state: {:#}", e);
        }
    }
}
