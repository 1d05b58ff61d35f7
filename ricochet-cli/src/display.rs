use colored::*;
use ricochet::model::ErrorReport;
use std::net::SocketAddr;

pub fn print_banner(role: &str, media: SocketAddr, coords: SocketAddr) {
    println!("{}", format!("ricochet {role}").green().bold());
    println!("   media  signaling: {}", media);
    println!("   coords signaling: {}", coords);
}

/// One line per scored estimate; color follows how far off it was.
pub fn print_report(report: &ErrorReport) {
    let distance = format!("{:.2}", report.distance);
    let distance = if report.distance < 5.0 {
        distance.green()
    } else if report.distance < 20.0 {
        distance.yellow()
    } else {
        distance.red().bold()
    };

    println!(
        "estimate {} actual {} error {}",
        report.estimate.to_string().cyan(),
        report.actual,
        distance
    );
}
