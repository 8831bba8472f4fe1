//! Boot banner and welcome text.

pub const LOGO: &str = r#"
 _______ _______ _     _ _______ _______
    |    |       |_____| |_____|    |
    |    |_____  |     | |     |    |
"#;

/// Fake POST sequence printed on startup, one line at a time.
pub fn boot_lines() -> Vec<String> {
    vec![
        "TCHAT BIOS v2.4 -- PHOSPHOR TERMINAL SYSTEMS".into(),
        "MEMORY TEST: 640K OK".into(),
        "DETECTING UPLINK............. OK".into(),
        "MOUNTING MESSAGE STORE....... OK".into(),
        "LOADING EMOTICON TABLES...... OK".into(),
        "CALIBRATING CRT PHOSPHOR..... OK".into(),
        String::new(),
    ]
}

pub fn welcome_lines(version: &str) -> Vec<String> {
    let mut lines: Vec<String> = LOGO.lines().map(str::to_string).collect();
    lines.push(format!("tchat {version} -- retro terminal chat"));
    lines.push("Type 'help' for commands. Type 'login' to join the network.".into());
    lines.push(String::new());
    lines
}
