use anyhow::Result;
use orders_core::config::Config;

pub fn run(mut config: Config, port: Option<u16>, interval_ms: Option<u64>) -> Result<()> {
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(ms) = interval_ms {
        config.poll.interval_ms = ms;
    }
    config.validate()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener =
            tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port)).await?;
        let actual_port = listener.local_addr()?.port();

        println!(
            "orderfeed → http://localhost:{actual_port}/api/sse/orders  (upstream {})",
            config.upstream.base_url
        );

        tokio::select! {
            res = orders_server::serve_on(config, listener) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
