//! Live-page audit: per-URL, per-device metrics from an opaque
//! browser-automation collector. Runs only when URLs are configured. Each
//! collect call carries its own timeout inside the collector plus a small
//! bounded retry here for transient transport failures; a URL that still
//! fails contributes zero findings and the run continues.

use super::{spool_and_finish, ScanContext};
use crate::core::{Category, CategoryResult, Finding};
use crate::external::{normalize_page_metrics, with_retry, DeviceProfile};
use std::time::Duration;

const RETRIES: usize = 2;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub async fn run(ctx: &ScanContext) -> CategoryResult {
    match try_run(ctx).await {
        Ok(result) => result,
        Err(e) => {
            log::warn!("live-page audit degraded to empty result: {e}");
            CategoryResult::empty(Category::LivePage)
        }
    }
}

async fn try_run(ctx: &ScanContext) -> anyhow::Result<CategoryResult> {
    let Some(collector) = &ctx.page_metrics else {
        log::debug!("no page-metrics collector configured; live-page audit is empty");
        return spool_and_finish(&ctx.output_dir, Category::LivePage, Vec::new());
    };

    let mut findings: Vec<Finding> = Vec::new();
    for url in &ctx.urls {
        for device in [DeviceProfile::Mobile, DeviceProfile::Desktop] {
            let collected = with_retry(RETRIES, RETRY_BACKOFF, || {
                collector.collect(url, device)
            })
            .await;
            match collected {
                Ok(metrics) => findings.extend(normalize_page_metrics(
                    &metrics,
                    url,
                    device,
                    ctx.page_score_threshold,
                )),
                Err(e) => log::warn!("page metrics failed for {url} ({}): {e}", device.as_str()),
            }
        }
    }

    spool_and_finish(&ctx.output_dir, Category::LivePage, findings)
}
