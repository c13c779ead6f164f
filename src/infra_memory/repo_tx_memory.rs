use crate::domain_port::{StorageTx, TxManager};

/// Memory repos apply writes eagerly; the transaction is a formality so the
/// services can use one code path for both backends. Rollback undoes nothing.
pub struct MemoryTxManager;

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        Ok(Box::new(MemoryTx))
    }
}

pub struct MemoryTx;

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}
