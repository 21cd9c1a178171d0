use tracing_subscriber::filter::LevelFilter;

pub fn init() {
    let level = if cfg!(test) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
