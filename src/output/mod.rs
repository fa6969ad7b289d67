pub mod formatter;

pub use formatter::{
    format_center_points, format_center_points_tsv, format_comparison, format_comparison_tsv,
    format_json, format_layer, format_layer_tsv, format_locality_markers,
    format_locality_markers_tsv, format_ranking_table, format_ranking_tsv, format_rate,
    should_use_colors, truncate,
};

/// Output format for the non-interactive subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}
