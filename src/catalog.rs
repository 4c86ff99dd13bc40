use rand::Rng;

/// The fixed messages emitted by the generator.
pub const MESSAGES: [&str; 10] = [
    "User signed in",
    "Cache refreshed successfully",
    "Background job completed",
    "Configuration loaded",
    "API request processed",
    "Disk space low",
    "Timeout while calling external service",
    "Database connection established",
    "Payment processed",
    "Email queued for sending",
];

/// Draws a message uniformly from [`MESSAGES`].
pub fn random_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    MESSAGES[rng.gen_range(0..MESSAGES.len())]
}
