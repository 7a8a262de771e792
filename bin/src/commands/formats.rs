//! Formats command implementation.

use geoport_lib::ExportFormat;

/// List the supported export formats.
pub(crate) fn list_formats() {
    println!("{:<10} {:<12} {:<10} {:<24}", "FORMAT", "TYPE", "EXTENSION", "ALIASES");
    println!("{}", "-".repeat(58));

    for format in ExportFormat::all() {
        println!(
            "{:<10} {:<12} {:<10} {:<24}",
            format.as_str(),
            format.label(),
            format!(".{}", format.extension()),
            format.aliases().join(", ")
        );
    }

    println!("\nTotal: {} formats", ExportFormat::all().len());
}
