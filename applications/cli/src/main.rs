/// Cadence - terminal music player
use anyhow::{bail, Context};
use cadence_cli::{
    config::CadenceConfig, load_library, Session, SessionCommand, SimulatedDevice, TrackFeed,
};
use cadence_client::{
    HttpTrackProvider, Pagination, ProviderConfig, ProviderTrack, TrackOrder, TrackProvider,
    TrackQuery,
};
use cadence_playback::RawTrack;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Queue-based music player for the Cadence track API", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Play from a JSON track library instead of the API
    #[arg(short, long, global = true, env = "CADENCE_LIBRARY")]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracks
    Tracks {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print the raw listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the most recently added tracks
    Featured {
        /// Number of tracks
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
    /// Queue matching tracks and start an interactive session
    Play {
        #[command(flatten)]
        filters: FilterArgs,

        /// Queue position to start from (1-based)
        #[arg(long, default_value_t = 1)]
        start: usize,

        /// Start with shuffle enabled
        #[arg(long)]
        shuffle: bool,

        /// Print engine events as JSON lines
        #[arg(long)]
        events: bool,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct FilterArgs {
    /// Match title, artist, album, genre or description
    #[arg(short, long)]
    search: Option<String>,

    /// Filter by genre
    #[arg(short, long)]
    genre: Option<String>,

    /// Sort order: title, artist or newest
    #[arg(short, long)]
    order: Option<TrackOrder>,

    /// Page number
    #[arg(short, long)]
    page: Option<u32>,

    /// Tracks per page
    #[arg(long)]
    limit: Option<u32>,
}

impl FilterArgs {
    fn into_query(self, default_limit: u32) -> TrackQuery {
        TrackQuery {
            search: self.search,
            genre: self.genre,
            order: self.order,
            page: self.page,
            limit: Some(self.limit.unwrap_or(default_limit)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence=info,cadence_cli=info,cadence_playback=info,cadence_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = CadenceConfig::load(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        config.provider.library_path = Some(library);
    }
    config.validate()?;

    match cli.command {
        Commands::Tracks { filters, json } => {
            let provider = build_provider(&config)?;
            let query = filters.into_query(config.provider.page_size);
            list_tracks(provider.as_ref(), &query, json).await?;
        }
        Commands::Featured { limit } => {
            if config.provider.library_path.is_some() {
                bail!("Featured tracks need the track API; drop --library");
            }
            let provider = http_provider(&config)?;
            let tracks = provider.featured_tracks(limit).await?;
            print_tracks(&tracks, 0);
        }
        Commands::Play {
            filters,
            start,
            shuffle,
            events,
        } => {
            let provider = build_provider(&config)?;
            let query = filters.into_query(config.provider.page_size);

            let mut playback = config.playback.clone();
            playback.shuffle |= shuffle;

            play(&config, provider, query, playback, start, events).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn http_provider(config: &CadenceConfig) -> anyhow::Result<HttpTrackProvider> {
    let mut provider_config = ProviderConfig::new(config.provider.base_url.clone())
        .with_timeout(config.provider.timeout());
    if let Some(token) = &config.provider.token {
        provider_config = provider_config.with_token(token.clone());
    }

    HttpTrackProvider::new(provider_config).context("Failed to create track provider")
}

fn build_provider(config: &CadenceConfig) -> anyhow::Result<Arc<dyn TrackProvider>> {
    let provider: Arc<dyn TrackProvider> = match &config.provider.library_path {
        Some(path) => Arc::new(load_library(path)?),
        None => Arc::new(http_provider(config)?),
    };
    Ok(provider)
}

async fn list_tracks(
    provider: &dyn TrackProvider,
    query: &TrackQuery,
    json: bool,
) -> anyhow::Result<()> {
    let page = provider.list_tracks(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    print_tracks(&page.tracks, page_offset(&page.pagination));
    println!(
        "Page {}/{} ({} tracks)",
        page.pagination.current_page, page.pagination.total_pages, page.pagination.total_items
    );

    Ok(())
}

/// Number of tracks listed before the given page
fn page_offset(pagination: &Pagination) -> usize {
    let skipped = u64::from(pagination.current_page.saturating_sub(1))
        * u64::from(pagination.items_per_page);
    usize::try_from(skipped).unwrap_or(usize::MAX)
}

fn print_tracks(tracks: &[ProviderTrack], offset: usize) {
    if tracks.is_empty() {
        println!("No tracks found");
        return;
    }

    for (i, track) in tracks.iter().enumerate() {
        let seconds = track.duration.max(0.0) as u64;
        println!(
            "{:>4}. {} - {} [{}] {}:{:02}",
            offset + i + 1,
            track.title,
            track.artist_name,
            track.genre.as_deref().unwrap_or("-"),
            seconds / 60,
            seconds % 60,
        );
    }
}

async fn play(
    config: &CadenceConfig,
    provider: Arc<dyn TrackProvider>,
    query: TrackQuery,
    playback: cadence_playback::PlaybackConfig,
    start: usize,
    events: bool,
) -> anyhow::Result<()> {
    let mut feed = TrackFeed::new(provider, query);
    let first_page = feed.next_page().await?.unwrap_or_default();
    if first_page.is_empty() {
        bail!("No tracks match the given filters");
    }

    let (mut device, device_events) = SimulatedDevice::new(
        config.session.tick_interval(),
        config.session.fallback_track_secs,
    );
    for track in &first_page {
        if let Some(url) = track.url.as_deref().filter(|_| track.duration > 0.0) {
            device.set_length(url, track.duration);
        }
    }

    let mut session = Session::new(
        device,
        device_events,
        playback,
        config.session.load_timeout(),
    )
    .with_feed(feed);

    if events {
        let (tx, mut rx) = mpsc::unbounded_channel();
        session = session.with_observer(tx);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{}", line);
                }
            }
        });
    }

    session.start(
        first_page.into_iter().map(RawTrack::from).collect(),
        start.saturating_sub(1),
    );
    if session.engine().queue().is_empty() {
        bail!("None of the matching tracks are playable");
    }

    println!(
        "Commands: play, pause, p (toggle), n (next), b (previous), seek <s>, vol <0-1>, \
         s (shuffle), r (repeat), goto <n>, more, status, q (quit)"
    );

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(read_commands(tx));

    session.run(rx).await?;
    Ok(())
}

async fn read_commands(tx: mpsc::Sender<SessionCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<SessionCommand>() {
            Ok(command) => {
                let quit = command == SessionCommand::Quit;
                if tx.send(command).await.is_err() || quit {
                    break;
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(current_page: u32, items_per_page: u32) -> Pagination {
        Pagination {
            current_page,
            total_pages: current_page,
            total_items: 0,
            items_per_page,
        }
    }

    #[test]
    fn page_offset_counts_earlier_pages() {
        assert_eq!(page_offset(&pagination(1, 20)), 0);
        assert_eq!(page_offset(&pagination(3, 20)), 40);
        assert_eq!(page_offset(&pagination(0, 20)), 0);
    }

    #[test]
    fn page_offset_handles_huge_pages() {
        let offset = page_offset(&pagination(u32::MAX, u32::MAX));
        let expected = u64::from(u32::MAX - 1) * u64::from(u32::MAX);
        assert_eq!(offset, usize::try_from(expected).unwrap_or(usize::MAX));
    }
}
