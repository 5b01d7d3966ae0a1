use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::args::Args;
use crate::formatter::{StopHandle, TimeAgo};

/// One line of `--json` output.
#[derive(Debug, Serialize)]
pub struct EmissionRecord<'a> {
    pub index: usize,
    pub input: &'a str,
    pub text: &'a str,
    pub next_refresh_ms: Option<u64>,
}

/// Watch every timestamp in `args` on a new tokio runtime until the
/// emission limit is reached or Ctrl+C is pressed.
///
/// # Errors
/// Returns an error if the runtime or Ctrl+C handler cannot be set up, or
/// if writing to stdout fails.
pub fn run_app(args: &Args) -> anyhow::Result<()> {
    let interrupt = Arc::new(Notify::new());
    let on_interrupt = Arc::clone(&interrupt);
    ctrlc::set_handler(move || on_interrupt.notify_one())
        .context("Error setting Ctrl+C handler")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let mut stdout = io::stdout().lock();
    let printed = runtime.block_on(watch_timestamps(args, &interrupt, &mut stdout))?;
    debug!(printed, "watch finished");
    Ok(())
}

/// Drive one formatter per timestamp, writing each emission to `out`.
///
/// Returns the number of emissions written.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub async fn watch_timestamps<W: Write>(
    args: &Args,
    interrupt: &Notify,
    out: &mut W,
) -> anyhow::Result<u64> {
    let limit = args
        .emission_limit()
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX));

    let mut formatters = Vec::with_capacity(args.timestamps.len());
    let mut handles: Vec<Option<StopHandle>> = Vec::with_capacity(args.timestamps.len());
    let mut streams: Vec<BoxStream<'static, (usize, String)>> = Vec::new();

    for (index, input) in args.inputs().into_iter().enumerate() {
        let mut formatter = TimeAgo::new();
        let ago = formatter.format(input);
        if ago.is_degenerate() {
            info!(input = %args.timestamps[index], "timestamp rejected");
        }
        handles.push(ago.stop_handle());

        let tagged = ago.map(move |text| (index, text));
        streams.push(match limit {
            Some(n) => tagged.take(n).boxed(),
            None => tagged.boxed(),
        });
        formatters.push(formatter);
    }

    let mut merged = stream::select_all(streams);
    let mut printed = 0_u64;
    loop {
        tokio::select! {
            item = merged.next() => {
                let Some((index, text)) = item else {
                    break;
                };
                let next_refresh = handles[index].as_ref().map(StopHandle::next_delay);
                write_emission(out, args, index, &text, next_refresh)?;
                printed += 1;
            }
            () = interrupt.notified() => {
                info!("interrupted, stopping formatters");
                break;
            }
        }
    }

    for formatter in &mut formatters {
        formatter.stop();
    }
    Ok(printed)
}

fn write_emission<W: Write>(
    out: &mut W,
    args: &Args,
    index: usize,
    text: &str,
    next_refresh: Option<std::time::Duration>,
) -> anyhow::Result<()> {
    let input = args.timestamps[index].as_str();
    if args.json {
        let record = EmissionRecord {
            index,
            input,
            text,
            next_refresh_ms: next_refresh.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        };
        serde_json::to_writer(&mut *out, &record).context("Failed to encode emission")?;
        writeln!(out)?;
    } else if args.timestamps.len() > 1 {
        writeln!(out, "{input}: {text}")?;
    } else {
        writeln!(out, "{text}")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn args_for(timestamps: &[&str]) -> Args {
        Args {
            timestamps: timestamps.iter().map(ToString::to_string).collect(),
            ..Args::default()
        }
    }

    fn lines(out: &[u8]) -> Vec<String> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    #[tokio::test]
    async fn once_prints_one_line_per_timestamp() {
        let mut args = args_for(&["2000-01-01T00:00:00Z"]);
        args.once = true;
        let mut out = Vec::new();

        let printed = watch_timestamps(&args, &Notify::new(), &mut out).await.unwrap();

        assert_eq!(printed, 1);
        let lines = lines(&out);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("years ago"), "{}", lines[0]);
    }

    #[tokio::test]
    async fn multiple_timestamps_are_labelled() {
        let mut args = args_for(&["2000-01-01T00:00:00Z", "not a date"]);
        args.once = true;
        let mut out = Vec::new();

        watch_timestamps(&args, &Notify::new(), &mut out).await.unwrap();

        let mut lines = lines(&out);
        lines.sort();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2000-01-01T00:00:00Z: "));
        assert_eq!(lines[1], "not a date: ");
    }

    #[tokio::test]
    async fn json_records_carry_next_refresh() {
        let mut args = args_for(&["2000-01-01T00:00:00Z", ""]);
        args.once = true;
        args.json = true;
        let mut out = Vec::new();

        watch_timestamps(&args, &Notify::new(), &mut out).await.unwrap();

        let mut records: Vec<Value> = lines(&out)
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        records.sort_by_key(|r| r["index"].as_u64());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["next_refresh_ms"], 300_000);
        assert_eq!(records[1]["text"], "");
        assert!(records[1]["next_refresh_ms"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn max_emissions_limits_each_stream() {
        let mut args = args_for(&["2000-01-01T00:00:00Z"]);
        args.max_emissions = Some(3);
        let mut out = Vec::new();

        let printed = watch_timestamps(&args, &Notify::new(), &mut out).await.unwrap();
        assert_eq!(printed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_ends_the_watch() {
        let args = args_for(&["2000-01-01T00:00:00Z"]);
        let interrupt = Notify::new();
        interrupt.notify_one();
        let mut out = Vec::new();

        let printed = watch_timestamps(&args, &interrupt, &mut out).await.unwrap();
        assert!(printed <= 1);
    }
}
