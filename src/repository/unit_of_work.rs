// ==========================================
// 线盘分配系统 - 工作单元
// ==========================================
// 职责: 为一次业务操作提供单一事务边界
// 说明: 闭包返回 Ok 时提交; 返回 Err 或发生 panic 时事务随 drop 回滚
// ==========================================

use crate::repository::coil_repo::CoilRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_line_repo::OrderLineRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AllocationRepositories - 仓储集合
// ==========================================
/// 同一事务内的仓储集合
pub struct AllocationRepositories<'c> {
    pub coils: CoilRepository<'c>,
    pub lines: OrderLineRepository<'c>,
}

impl<'c> AllocationRepositories<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            coils: CoilRepository::new(conn),
            lines: OrderLineRepository::new(conn),
        }
    }
}

// ==========================================
// UnitOfWork - 工作单元
// ==========================================
#[derive(Clone)]
pub struct UnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl UnitOfWork {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中执行操作
    ///
    /// # 参数
    /// - `work`: 使用事务内仓储完成的业务操作
    ///
    /// # 返回
    /// - `Ok(T)`: 操作成功且事务已提交
    /// - `Err(E)`: 操作失败, 所有写入已回滚
    pub fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&AllocationRepositories<'_>) -> Result<T, E>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let value = {
            let repos = AllocationRepositories::new(&tx);
            work(&repos)?
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coil, OrderLine};

    fn setup_uow() -> UnitOfWork {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        UnitOfWork::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_commit_on_success() {
        let uow = setup_uow();

        uow.run(|repos| -> RepositoryResult<()> {
            repos.coils.insert(&Coil::new("COIL-001", "AVVG-2x6", 100, 5, 1))
        })
        .unwrap();

        let found = uow
            .run(|repos| repos.coils.find_by_reference("COIL-001"))
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_rollback_on_error() {
        let uow = setup_uow();

        let result = uow.run(|repos| -> RepositoryResult<()> {
            repos
                .lines
                .insert(&OrderLine::new("ORDER-001", "LINE-001", "AVVG-2x6", 10))?;
            repos.coils.insert(&Coil::new("COIL-001", "AVVG-2x6", 100, 5, 1))?;
            Err(RepositoryError::InternalError("abort".to_string()))
        });
        assert!(result.is_err());

        let (coils, lines) = uow
            .run(|repos| -> RepositoryResult<_> {
                Ok((repos.coils.list_all()?, repos.lines.list_all()?))
            })
            .unwrap();
        assert!(coils.is_empty());
        assert!(lines.is_empty());
    }
}
