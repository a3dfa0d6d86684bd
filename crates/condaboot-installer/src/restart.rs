use std::io::Write;

/// Cooperative self-termination. The host control plane observes the exit and
/// relaunches the kernel through the (now interposed) interpreter path.
pub fn restart_kernel() -> ! {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    std::process::exit(0)
}
