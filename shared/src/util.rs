/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a display number: prefix + last 8 decimal digits of the current
/// epoch-millisecond timestamp + 4 random uppercase base-36 characters.
///
/// Collisions are possible under concurrent generation; the storage layer
/// enforces uniqueness and callers regenerate on conflict.
fn display_number(prefix: &str) -> String {
    use rand::Rng;

    let millis = now_millis();
    let tail = millis.unsigned_abs() % 100_000_000;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{:08}{}", prefix, tail, suffix)
}

/// Order number, e.g. `NO12345678A9QX`
pub fn order_number() -> String {
    display_number("NO")
}

/// Return number, e.g. `RT12345678B0ZK`
pub fn return_number() -> String {
    display_number("RT")
}

/// Refund number, e.g. `RF12345678C1MP`
pub fn refund_number() -> String {
    display_number("RF")
}
