pub mod youtube_rss;
