//! Formatted output helpers for the CLI.

use dbuilder_manifest::GenerateReport;

/// Formats a one-line summary of a generation run.
#[must_use]
pub fn format_report(report: &GenerateReport) -> String {
    format!(
        "Wrote {} for {} to {}",
        plural(report.dockerfiles.len(), "dockerfile"),
        plural(report.packages, "package"),
        report.makefile.display()
    )
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn report(dockerfiles: usize, packages: usize) -> GenerateReport {
        GenerateReport {
            dockerfiles: (0..dockerfiles)
                .map(|i| PathBuf::from(format!("{i}.dockerfile")))
                .collect(),
            makefile: PathBuf::from("dockerfiles/Makefile"),
            packages,
            targets: 0,
        }
    }

    #[test]
    fn format_report_pluralizes() {
        assert_eq!(
            format_report(&report(2, 1)),
            "Wrote 2 dockerfiles for 1 package to dockerfiles/Makefile"
        );
    }

    #[test]
    fn format_report_singular() {
        assert_eq!(
            format_report(&report(1, 1)),
            "Wrote 1 dockerfile for 1 package to dockerfiles/Makefile"
        );
    }

    #[test]
    fn format_report_empty() {
        assert_eq!(
            format_report(&report(0, 0)),
            "Wrote 0 dockerfiles for 0 packages to dockerfiles/Makefile"
        );
    }
}
