use anyhow::Result;

use super::Service;
use super::helpers::{print_json, truncate};

pub(crate) fn cmd_news(svc: &Service, titles: &[String], json: bool) -> Result<()> {
    let articles = svc.news(titles)?;

    if json {
        print_json(&articles)?;
        return Ok(());
    }

    if articles.is_empty() {
        eprintln!("No news found.");
        return Ok(());
    }

    for a in &articles {
        println!("{}", a.title);
        let date = a.published_at.get(..10).unwrap_or(&a.published_at);
        match (a.source.name.is_empty(), date.is_empty()) {
            (false, false) => println!("  {} · {date}", a.source.name),
            (false, true) => println!("  {}", a.source.name),
            (true, false) => println!("  {date}"),
            (true, true) => {}
        }
        if !a.description.is_empty() {
            println!("  {}", truncate(&a.description, 160));
        }
        println!("  {}\n", a.url);
    }
    Ok(())
}
