use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use tracing::{error, info};

use crate::{
    config::{ExecutionMode, RandomRange, Settings},
    error::Result,
    types::ExecutionReport,
    utils::sleep_random,
};

use super::Wallet;

/// Work applied to one wallet. Each call owns its wallet handle so the future is `'static`.
pub type WalletTask = dyn Fn(Wallet) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// How a task is fanned out over a set of wallets.
///
/// Implementations never propagate a task's error: failures are logged with
/// the wallet identity and collected in the [`ExecutionReport`].
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn run(&self, wallets: &[Wallet], task: &WalletTask) -> ExecutionReport;
}

/// Picks the strategy named by `MODE`. Called once at startup.
pub fn strategy_for(settings: &Settings) -> Box<dyn ExecutionStrategy> {
    match settings.mode {
        ExecutionMode::Batch => Box::new(BatchStrategy::new(settings.batch_size, settings.sleep_time)),
        ExecutionMode::Chain => Box::new(SequentialStrategy::new(settings.sleep_time)),
    }
}

fn record(report: &mut ExecutionReport, wallet: &Wallet, result: Result<()>) {
    match result {
        Ok(()) => report.succeeded.push(wallet.index()),
        Err(e) => {
            error!("{} {}", wallet.info(), e);
            report.failed.push((wallet.index(), e.to_string()));
        }
    }
}

/// Runs wallets one at a time in input order, sleeping between them.
pub struct SequentialStrategy {
    sleep: RandomRange,
}

impl SequentialStrategy {
    pub fn new(sleep: RandomRange) -> Self {
        Self { sleep }
    }
}

#[async_trait]
impl ExecutionStrategy for SequentialStrategy {
    async fn run(&self, wallets: &[Wallet], task: &WalletTask) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for (position, wallet) in wallets.iter().enumerate() {
            report.groups.push(vec![wallet.index()]);
            let result = task(wallet.clone()).await;
            record(&mut report, wallet, result);

            if position + 1 < wallets.len() {
                sleep_random(&self.sleep, wallet.info()).await;
                report.pauses += 1;
            }
        }

        report
    }
}

/// Runs consecutive groups of `batch_size` wallets concurrently, sleeping between groups.
pub struct BatchStrategy {
    batch_size: usize,
    sleep: RandomRange,
}

impl BatchStrategy {
    pub fn new(batch_size: usize, sleep: RandomRange) -> Self {
        Self {
            batch_size: batch_size.max(1),
            sleep,
        }
    }
}

#[async_trait]
impl ExecutionStrategy for BatchStrategy {
    async fn run(&self, wallets: &[Wallet], task: &WalletTask) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let group_count = wallets.len().div_ceil(self.batch_size);

        for (position, group) in wallets.chunks(self.batch_size).enumerate() {
            let indices: Vec<usize> = group.iter().map(Wallet::index).collect();
            info!(
                batch = position + 1,
                total = group_count,
                wallets = ?indices,
                "Running batch"
            );
            report.groups.push(indices);

            // every task is awaited even when a sibling fails
            let results = future::join_all(group.iter().map(|wallet| task(wallet.clone()))).await;
            for (wallet, result) in group.iter().zip(results) {
                record(&mut report, wallet, result);
            }

            if position + 1 < group_count {
                sleep_random(&self.sleep, &format!("[batch {}/{}]", position + 1, group_count))
                    .await;
                report.pauses += 1;
            }
        }

        report
    }
}
