use anyhow::Result;
use quiz_scenario::utils::logging;
use quiz_scenario::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let results = App::initialize(config).await?.run().await?;

    if results.iter().any(|(_, r)| r.is_err()) {
        anyhow::bail!("部分场景回放失败");
    }

    Ok(())
}
