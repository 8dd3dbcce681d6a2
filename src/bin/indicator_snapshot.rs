use smi_signal_bot::{CandleStore, GateioRestClient, IndicatorEngine, MaAngleSource, SeriesKey};
use smi_signal_bot::strategy::alert::{format_bar_time, utc_offset};
use clap::{Parser, ValueEnum};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AngleLine {
    Ema,
    Jma,
}

impl From<AngleLine> for MaAngleSource {
    fn from(line: AngleLine) -> Self {
        match line {
            AngleLine::Ema => MaAngleSource::Ema,
            AngleLine::Jma => MaAngleSource::Jma,
        }
    }
}

/// Fetch candle history and print the latest indicator values
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Futures contract
    #[arg(long, default_value = "XRP_USDT")]
    contract: String,

    /// Candle interval
    #[arg(short, long, default_value = "1m")]
    interval: String,

    /// Number of latest bars to print
    #[arg(short, long, default_value = "5")]
    rows: usize,

    /// Line the MA angle is measured on
    #[arg(long, value_enum, default_value = "ema")]
    angle_line: AngleLine,

    #[arg(long, default_value = "https://api.gateio.ws/api/v4")]
    api_endpoint: String,

    /// UTC offset in hours for printed bar times
    #[arg(long, default_value = "9", allow_hyphen_values = true)]
    utc_offset: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let rest = GateioRestClient::new(args.api_endpoint.clone(), 2000)?;
    let bars = rest.fetch_candles(&args.contract, &args.interval).await?;
    println!("Fetched {} {} candles for {}", bars.len(), args.interval, args.contract);

    let store = Arc::new(CandleStore::new());
    let key = SeriesKey::new(args.contract.as_str(), args.interval.as_str());
    store.bulk_replace(&key, bars);

    let engine = IndicatorEngine::new(store).with_angle_source(args.angle_line.into());
    let snapshot = engine.snapshot(&key);
    if !snapshot.is_complete() {
        println!("Not enough history for every indicator ({} bars)", snapshot.bars.len());
    }

    let aligned = snapshot.aligned();
    let offset = utc_offset(args.utc_offset);
    println!();
    println!("{:<12} {:>12} {:>8} {:>8} {:>6} {:>8}", "time", "close", "smi", "signal", "trend", "slope");

    let start = snapshot.bars.len().saturating_sub(args.rows);
    for bar in &snapshot.bars[start..] {
        let smi = aligned.smi.get(&bar.time);
        let trend = match aligned.ema_cloud.get(&bar.time) {
            Some(p) if p.up_trend => "up",
            Some(p) if p.down_trend => "down",
            Some(_) => "flat",
            None => "-",
        };
        let slope = aligned.ma_angles.get(&bar.time);

        println!(
            "{:<12} {:>12.4} {:>8} {:>8} {:>6} {:>8}",
            format_bar_time(bar.time, offset),
            bar.close,
            smi.map_or("-".to_string(), |p| format!("{:.1}", p.smi)),
            smi.map_or("-".to_string(), |p| format!("{:.1}", p.signal)),
            trend,
            slope.map_or("-".to_string(), |p| format!("{:.2}", p.slope)),
        );
    }

    Ok(())
}
