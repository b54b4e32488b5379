//! Console output of the active-order snapshot.

use anyhow::Result;
use loadgen_core::snapshot::ActiveOrderView;

/// Render one snapshot as a plain-text table.
pub fn render_table(game_time: &str, rows: &[ActiveOrderView]) -> String {
    let mut out = format!("[{game_time}] {} active order(s)\n", rows.len());
    for row in rows {
        out.push_str(&format!(
            "  #{:<8} {:<7} rider {:<8} ({:.5}, {:.5}) -> ({:.5}, {:.5})  created {}  expires in {}\n",
            row.order_id,
            row.kind,
            row.rider_id,
            row.origin.lat,
            row.origin.lon,
            row.destination.lat,
            row.destination.lon,
            row.created_time_of_day,
            row.remaining_text,
        ));
    }
    out
}

/// Render one snapshot as a single JSON line.
pub fn render_json_line(game_time: &str, rows: &[ActiveOrderView]) -> Result<String> {
    let line = serde_json::json!({
        "game_time": game_time,
        "active_orders": rows,
    });
    Ok(serde_json::to_string(&line)?)
}
