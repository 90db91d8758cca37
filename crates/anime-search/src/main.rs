//! Anime search CLI application.

use anime_search::api::{Anime, AnimeFull, Pagination};
use anime_search::display::join_names;
use anime_search::{
    DetailCoordinator, DetailSnapshot, DetailView, JikanClient, MemoryHistory, SearchCoordinator,
    SearchParams, SearchSnapshot, SearchView,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{Config, LogConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the results
    Search {
        /// Search text
        query: Option<String>,

        /// Page to show
        #[arg(short, long)]
        page: Option<u32>,

        /// Start from a location such as `/?q=naruto&page=3` instead
        #[arg(long, conflicts_with_all = ["query", "page"])]
        location: Option<String>,
    },

    /// Print the details of one anime
    Detail {
        /// MyAnimeList identifier
        id: u32,
    },

    /// Line-driven search session
    Interactive {
        /// Location to start from
        #[arg(long, default_value = "/")]
        location: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_or_default(&args.config);

    let mut log_config = LogConfig::from_settings("anime-search", &config.log_dir(), &config.logging);
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    let client = Arc::new(JikanClient::from_config(&config.catalog).context("Failed to create Jikan client")?);
    info!(base_url = client.base_url(), "Catalog client ready");

    match args.command {
        Command::Search {
            query,
            page,
            location,
        } => {
            let location = location.unwrap_or_else(|| {
                let params = SearchParams::new(query.unwrap_or_default(), page.unwrap_or(1));
                format!("/?{}", params.to_query_string())
            });
            search_once(client, &config, &location).await
        }
        Command::Detail { id } => detail_once(client, id).await,
        Command::Interactive { location } => interactive(client, &config, &location).await,
    }
}

async fn search_once(client: Arc<JikanClient>, config: &Config, location: &str) -> Result<()> {
    let history = MemoryHistory::new(location);
    let coordinator = SearchCoordinator::new(client, Box::new(history.clone()), config.debounce_delay());

    if coordinator.params().query.trim().is_empty() {
        render_search(&coordinator.snapshot());
        return Ok(());
    }

    let (mut handle, task) = coordinator.spawn();
    let snapshot = handle
        .wait_for(|snapshot| snapshot.lifecycle.is_settled())
        .await
        .context("Search stopped before finishing")?;

    render_search(&snapshot);
    println!("{}", history.location());

    drop(handle);
    task.await.context("Search task panicked")?;
    Ok(())
}

async fn detail_once(client: Arc<JikanClient>, mal_id: u32) -> Result<()> {
    let (mut handle, task) = DetailCoordinator::new(client).spawn();
    handle.open(mal_id);

    let snapshot = handle
        .wait_for(|snapshot| snapshot.lifecycle.is_settled())
        .await
        .context("Lookup stopped before finishing")?;
    render_detail(&snapshot);

    drop(handle);
    task.await.context("Detail task panicked")?;
    Ok(())
}

/// One line of interactive input
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Query(String),
    Next,
    Previous,
    Page(u32),
    Clear,
    Open(u32),
    Back,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Query(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let argument = parts.next();

    let number = |what: &str| -> Result<u32, String> {
        argument
            .ok_or_else(|| format!(":{} needs a {}", name, what))?
            .parse()
            .map_err(|_| format!("not a valid {}: {}", what, argument.unwrap_or("")))
    };

    match name {
        "next" => Ok(Input::Next),
        "prev" => Ok(Input::Previous),
        "page" => number("page number").map(Input::Page),
        "clear" => Ok(Input::Clear),
        "open" => number("id").map(Input::Open),
        "back" => Ok(Input::Back),
        "quit" | "q" => Ok(Input::Quit),
        other => Err(format!("unknown command :{}", other)),
    }
}

async fn interactive(client: Arc<JikanClient>, config: &Config, location: &str) -> Result<()> {
    let history = MemoryHistory::new(location);
    let search = SearchCoordinator::new(
        Arc::clone(&client),
        Box::new(history.clone()),
        config.debounce_delay(),
    );
    let (mut search, search_task) = search.spawn();
    let (mut detail, detail_task) = DetailCoordinator::new(client).spawn();

    println!("Type to search. Commands: :next :prev :page N :clear :open ID :back :quit");
    let mut shown_location = history.location();
    println!("{}", shown_location);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut detail_open = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Query(text)) => {
                        search.set_query(text);
                    }
                    Ok(Input::Next) => {
                        search.next_page();
                    }
                    Ok(Input::Previous) => {
                        search.previous_page();
                    }
                    Ok(Input::Page(page)) => {
                        search.set_page(page);
                    }
                    Ok(Input::Clear) => {
                        search.clear();
                    }
                    Ok(Input::Open(mal_id)) => {
                        detail_open = true;
                        detail.open(mal_id);
                    }
                    Ok(Input::Back) => {
                        if detail_open {
                            detail_open = false;
                            detail.close();
                            render_search(&search.snapshot());
                        }
                    }
                    Err(message) => eprintln!("{}", message),
                }
            }
            Some(snapshot) = search.changed() => {
                let current = history.location();
                if current != shown_location {
                    println!("{}", current);
                    shown_location = current;
                }
                if !detail_open {
                    render_search(&snapshot);
                }
            }
            Some(snapshot) = detail.changed() => {
                if detail_open {
                    render_detail(&snapshot);
                }
            }
        }
    }

    drop(search);
    drop(detail);
    search_task.await.context("Search task panicked")?;
    detail_task.await.context("Detail task panicked")?;
    info!("Session ended");
    Ok(())
}

fn render_search(snapshot: &SearchSnapshot) {
    match snapshot.view() {
        SearchView::Prompt => println!("Start typing to search for anime."),
        SearchView::Loading => println!("Searching for \"{}\"...", snapshot.debounced_query),
        SearchView::Failed(message) => println!("Error: {}", message),
        SearchView::Empty(query) => println!("No results for \"{}\".", query),
        SearchView::Results { items, pagination } => {
            for anime in items {
                render_card(anime);
            }
            render_pagination(pagination);
        }
    }
}

fn render_card(anime: &Anime) {
    let mut line = format!("[{}] {}", anime.mal_id, anime.title);
    if let Some(kind) = &anime.anime_type {
        line.push_str(&format!(" ({})", kind));
    }
    if let Some(score) = anime.score_label() {
        line.push_str(&format!("  score {}", score));
    }
    if let Some(episodes) = anime.episodes {
        line.push_str(&format!("  {} eps", episodes));
    }
    if let Some(season) = anime.season_label() {
        line.push_str(&format!("  {}", season));
    }
    println!("{}", line);

    let genres = anime.genre_names();
    if !genres.is_empty() {
        println!("    {}", genres);
    }
}

fn render_pagination(pagination: &Pagination) {
    let mut line = format!(
        "Page {} of {}",
        pagination.current_page, pagination.last_visible_page
    );
    if let Some(total) = pagination.total_items() {
        line.push_str(&format!(" ({} results)", total));
    }
    if pagination.current_page > 1 {
        line.push_str("  :prev");
    }
    if pagination.has_next_page {
        line.push_str("  :next");
    }
    println!("{}", line);
}

fn render_detail(snapshot: &DetailSnapshot) {
    match snapshot.view() {
        DetailView::Idle => {}
        DetailView::Loading => println!("Loading details..."),
        DetailView::Failed(message) => println!("Error: {}", message),
        DetailView::Ready(item) => render_sheet(item),
    }
}

fn render_sheet(item: &AnimeFull) {
    let anime = &item.anime;
    println!("{}", anime.title);
    if let Some(english) = anime.english_title() {
        println!("{}", english);
    }
    if let Some(japanese) = &anime.title_japanese {
        println!("{}", japanese);
    }
    if let Some(image) = anime.preferred_image() {
        println!("{}", image);
    }
    println!();

    let mut stats = Vec::new();
    if let Some(score) = anime.score_label() {
        stats.push(format!("Score {}", score));
    }
    if let Some(rank) = anime.rank {
        stats.push(format!("Rank #{}", rank));
    }
    if let Some(popularity) = anime.popularity {
        stats.push(format!("Popularity #{}", popularity));
    }
    if !stats.is_empty() {
        println!("{}", stats.join("  "));
    }

    let fields = [
        ("Type", anime.anime_type.clone()),
        ("Episodes", anime.episodes.map(|episodes| episodes.to_string())),
        ("Status", anime.status.clone()),
        ("Duration", anime.duration.clone()),
        ("Season", anime.season_label()),
        ("Source", anime.source.clone()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{:<10}{}", label, value);
        }
    }

    if let Some(synopsis) = &anime.synopsis {
        println!("\nSynopsis\n{}", synopsis);
    }
    if let Some(background) = &anime.background {
        println!("\nBackground\n{}", background);
    }

    let lists = [
        ("Genres", join_names(&anime.genres)),
        ("Themes", join_names(&anime.themes)),
        ("Studios", join_names(&item.studios)),
        ("Producers", join_names(&item.producers)),
    ];
    for (label, names) in lists {
        if !names.is_empty() {
            println!("{:<10}{}", label, names);
        }
    }
}
