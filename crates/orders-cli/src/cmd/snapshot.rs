use crate::output::{print_json, print_table};
use anyhow::Result;
use orders_core::config::Config;
use orders_core::fetch::HttpSnapshotFetcher;
use orders_core::types::{Snapshot, SnapshotMessage};

pub fn run(config: &Config, json: bool) -> Result<()> {
    config.validate()?;
    let fetcher = HttpSnapshotFetcher::new(&config.upstream)?;
    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(fetcher.fetch_snapshot())?;

    if json {
        let Snapshot {
            orders,
            pending_customer_ids,
        } = snapshot;
        return print_json(&SnapshotMessage::Snapshot {
            orders,
            pending_customer_ids: Some(pending_customer_ids),
        });
    }

    if snapshot.orders.is_empty() {
        println!("No visible orders.");
    } else {
        let rows = snapshot
            .orders
            .iter()
            .map(|o| vec![o.number.clone(), o.status.clone(), o.phase().to_string()])
            .collect();
        print_table(&["NUMBER", "STATUS", "PHASE"], rows);
    }

    println!();
    if snapshot.pending_customer_ids.is_empty() {
        println!("No pending orders.");
    } else {
        let ids: Vec<&str> = snapshot
            .pending_customer_ids
            .iter()
            .map(String::as_str)
            .collect();
        println!("Pending ({}): {}", ids.len(), ids.join(", "));
    }
    Ok(())
}
