// Import the client object.
use statistician::{Client, Config, Emitter};

fn main() -> statistician::Result<()> {
    let config = Config {
        prefix: Some("myapp".to_string()),
        ..Config::default()
    };
    let mut client = Client::from_config(&config)?;
    client.incr("some.metric")?;

    let mut pipeline = client.pipeline();
    pipeline.incr("gorets")?;
    {
        let _timer = pipeline.timer("glork");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    pipeline.gauge("gaugor", 16.0)?;
    pipeline.flush()?;

    println!("Sent some metrics!");
    Ok(())
}
