// ==========================================
// 线盘分配系统 - 命令行入口
// ==========================================
// 职责: 初始化日志与应用状态, 输出库存概况
// ==========================================

use coil_allocation::app::{get_default_db_path, AppState};
use coil_allocation::logging;

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", coil_allocation::APP_NAME);
    tracing::info!("系统版本: {}", coil_allocation::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径（可通过命令行第一个参数覆盖）
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let coils = state.coil_api.list_coils()?;
    let lines = state.order_line_api.list_lines()?;
    let unallocated = state.order_line_api.list_unallocated_lines()?;

    for coil in &coils {
        tracing::info!(
            reference = %coil.reference,
            product_id = %coil.product_id,
            allocations = coil.allocation_count(),
            available = coil.available_quantity(),
            "线盘"
        );
    }

    tracing::info!(
        coils = coils.len(),
        lines = lines.len(),
        unallocated = unallocated.len(),
        "库存概况"
    );

    Ok(())
}
