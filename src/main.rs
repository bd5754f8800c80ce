use std::path::Path;

use rust_image_scraper::config::Config;
use rust_image_scraper::crawler::ImageCrawl;
use rust_image_scraper::keywords;

fn init_logging() {
    log4rs::init_file("log4rs.yml", Default::default()).unwrap_or_else(|_| {
        // No logging config next to the binary; log to stderr instead
        let stderr = log4rs::append::console::ConsoleAppender::builder()
            .target(log4rs::append::console::Target::Stderr)
            .build();
        let config = log4rs::config::Config::builder()
            .appender(log4rs::config::Appender::builder().build("stderr", Box::new(stderr)))
            .build(
                log4rs::config::Root::builder()
                    .appender("stderr")
                    .build(log::LevelFilter::Info),
            )
            .unwrap();
        let _ = log4rs::init_config(config);
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::load();
    let args: Vec<String> = std::env::args().skip(1).collect();

    // `query <keyword...>` drives each engine's own search form and stops
    // there; anything else is a full crawl, with an optional keyword-file
    // path as the first argument.
    if args.first().map(String::as_str) == Some("query") {
        if args.len() < 2 {
            log::error!("query mode needs at least one keyword");
            return Ok(());
        }
        let crawl = ImageCrawl::new(config)?;
        for keyword in &args[1..] {
            crawl.submit_queries(keyword);
        }
        return Ok(());
    }

    let keyword_path = args
        .first()
        .cloned()
        .unwrap_or_else(|| config.keyword_file.clone());
    let keyword_list = keywords::load_keywords(Path::new(&keyword_path))?;
    if keyword_list.is_empty() {
        log::error!("No keywords in {}", keyword_path);
        return Ok(());
    }
    log::info!(
        "Loaded {} keywords from {}; sources: {:?}",
        keyword_list.len(),
        keyword_path,
        config.enabled_sources()
    );

    let crawl = ImageCrawl::new(config)?;
    let progress = crawl.run(&keyword_list).await?;

    log::info!(
        "Crawl finished: {} sources, {} images downloaded, {} duplicates skipped",
        progress.sources.len(),
        progress
            .sources
            .iter()
            .map(|s| s.images_downloaded)
            .sum::<usize>(),
        progress
            .sources
            .iter()
            .map(|s| s.duplicates_skipped)
            .sum::<usize>(),
    );
    Ok(())
}
