use std::path::Path;

use crate::runner::RunResult;

/// Everything one invocation of the runner produced.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunReport {
    pub label: String,
    pub kernel: Option<String>,
    pub results: Vec<RunResult>,
}

/// Save a report as pretty JSON, creating parent directories.
pub fn save_report(path: &Path, report: &RunReport) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// Format results as a markdown summary table.
pub fn format_markdown(results: &[RunResult]) -> String {
    let mut out = String::new();
    out.push_str("| Scene | Size | Shapes | Bytes | Workgroups | Dispatched | Mean (ms) | P95 (ms) | Max (ms) |\n");
    out.push_str("|-------|------|--------|-------|------------|------------|-----------|----------|----------|\n");

    for r in results {
        out.push_str(&format!(
            "| {} | {}x{} | {} | {} | {}x{}x{} | {}/{} | {:.2} | {:.2} | {:.2} |\n",
            r.scene_name,
            r.width,
            r.height,
            r.shape_count,
            r.shape_bytes,
            r.workgroups[0],
            r.workgroups[1],
            r.workgroups[2],
            r.dispatched_frames,
            r.frames,
            r.timings.mean_ms,
            r.timings.p95_ms,
            r.timings.max_ms,
        ));
    }

    out
}
