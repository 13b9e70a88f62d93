//! Blog admin walkthrough: create, filter, render, cascade a tag and export

use serde_json::json;
use shelf::prelude::*;

fn print_page(page: &RenderedPage) {
    for DisplayRow { id, title, badges, meta, .. } in &page.rows {
        println!("   #{id:<3} {title:<36} [{}] {}", badges.join(", "), meta.join(" · "));
    }
    println!("   {}\n", page.footer);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shelf=info")),
        )
        .init();

    println!("📝 Shelf Blog Admin Example\n");

    let config = ShelfConfig::from_yaml_str("pagination:\n  default_page_size: 2\n")?;
    let kv = config.open_storage()?;
    let mut blog = Blog::open(kv, config.store_options());
    let mut events = blog.subscribe();

    println!("📋 Seeded {} posts\n", blog.posts().len());

    let post = blog.create_post(json!({
        "title": "Event Buses Instead of Timers",
        "category": "Architecture",
        "excerpt": "Subscribe to a store instead of polling it.",
        "content": "Every successful mutation publishes a change event...",
        "tags": "events, rust, architecture",
        "published": true,
    }))?;
    println!("✅ Created post #{} ({} min read)", post.id, post.reading_time());

    for _ in 0..3 {
        blog.record_view(post.id)?;
    }

    if let Err(e) = blog.create_post(json!({ "title": "Untitled" })) {
        println!("⚠️  {}", e.to_notice().message);
    }

    while let Ok(envelope) = events.try_recv() {
        println!("🔔 {} {:?}", envelope.event.action(), envelope.event.id());
    }

    println!("\n🔎 Posts tagged 'rust', newest first:");
    let filter = FilterState::default().with_tag("rust").with_sort(SortKey::Newest);
    print_page(&blog.render(&filter, config.page(1, 0)));

    println!("🔎 Page 9 of the same view clamps to the last page:");
    print_page(&blog.render(&filter, config.page(9, 0)));

    let stripped = blog.delete_tag("rust")?;
    println!("🏷️  Deleted tag 'rust' from {} posts; tags now {:?}\n", stripped, blog.tags());

    let stats = blog.stats();
    println!("📊 Stats");
    println!("   posts: {} ({} drafts), views: {}", stats.total_posts, stats.drafts, stats.total_views);
    println!("   top tags: {:?}", stats.top_tags);
    if let Some((weekday, count)) = &stats.busiest_weekday {
        println!("   busiest weekday: {weekday} ({count} posts)");
    }
    println!("   posts per month: {:.2}\n", stats.posts_per_month);

    let export = blog.export().to_json()?;
    println!("💾 Export is {} bytes", export.len());

    blog.teardown()?;
    println!("\n✨ Done");
    Ok(())
}
