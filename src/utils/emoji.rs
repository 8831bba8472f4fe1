//! Emoticon shortcode table.
//!
//! Shortcodes are parenthesized words replaced inline in outgoing message
//! text. The table order is the order the `emoji` listing and tab completion
//! present them in.

pub const EMOJI_TABLE: &[(&str, &str)] = &[
    ("(smile)", "ツ"),
    ("(happy)", "(ᵔ◡ᵔ)"),
    ("(sad)", "(︶︹︶)"),
    ("(cry)", "(;﹏;)"),
    ("(angry)", "(╬ Ò﹏Ó)"),
    ("(shrug)", "¯\\_(ツ)_/¯"),
    ("(tableflip)", "(ノ ゜Д゜)ノ ︵ ┻━┻"),
    ("(unflip)", "┬─┬ノ( º _ ºノ)"),
    ("(lenny)", "( ͡° ͜ʖ ͡°)"),
    ("(disapprove)", "ಠ_ಠ"),
    ("(bear)", "ʕ•ᴥ•ʔ"),
    ("(cat)", "(=^･ω･^=)"),
    ("(dog)", "(❍ᴥ❍ʋ)"),
    ("(fish)", "<º))))><"),
    ("(wave)", "( ^_^)／"),
    ("(hug)", "(づ｡◕‿‿◕｡)づ"),
    ("(kiss)", "( ˘ ³˘)"),
    ("(heart)", "♥"),
    ("(brokenheart)", "</3"),
    ("(star)", "☆"),
    ("(music)", "♪♫"),
    ("(peace)", "✌"),
    ("(fight)", "(ง'̀-'́)ง"),
    ("(flex)", "ᕙ(⇀‸↼‶)ᕗ"),
    ("(run)", "ε=ε=ε=┌(;･_･)┘"),
    ("(dance)", "♪┏(・o･)┛♪"),
    ("(magic)", "(ﾉ◕ヮ◕)ﾉ*:･ﾟ✧"),
    ("(sleep)", "(－_－) zzZ"),
    ("(confused)", "(°ロ°) !"),
    ("(sweat)", "(￣▽￣*)ゞ"),
    ("(wink)", "(^_~)"),
    ("(devil)", "ψ(｀∇´)ψ"),
    ("(zen)", "⊹╰(⌣ʟ⌣)╯⊹"),
    ("(salute)", "(￣^￣)ゞ"),
    ("(why)", "ლ(ಠ益ಠლ)"),
    ("(creep)", "ԅ(≖‿≖ԅ)"),
    ("(gimme)", "༼ つ ◕_◕ ༽つ"),
    ("(success)", "(•̀ᴗ•́)و ̑̑"),
    ("(dead)", "(✖╭╮✖)"),
    ("(cool)", "(⌐■_■)"),
    ("(hide)", "┬┴┬┴┤(･_├┬┴┬┴"),
    ("(point)", "(☞ﾟヮﾟ)☞"),
    ("(pray)", "(人･㉨･)"),
    ("(sparkle)", "✧･ﾟ: *✧･ﾟ:*"),
    ("(coffee)", "c[_]"),
    ("(sword)", "o()xxxx[{::::::::::::::::::>"),
    ("(gun)", "︻╦╤─"),
    ("(bomb)", "( ・ω・)つ≡≡●~*"),
    ("(rose)", "@}-,-'---"),
    ("(umbrella)", "☂"),
    ("(snowman)", "☃"),
    ("(skull)", "☠"),
    ("(yinyang)", "☯"),
    ("(check)", "✓"),
    ("(cross)", "✗"),
    ("(arrow)", "➤"),
    ("(infinity)", "∞"),
    ("(lambda)", "λ"),
    ("(ohm)", "Ω"),
    ("(degrees)", "°"),
];

/// Glyph for a shortcode, parentheses included, exact match only.
pub fn lookup(code: &str) -> Option<&'static str> {
    EMOJI_TABLE
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, glyph)| *glyph)
}

/// All shortcodes in table order.
pub fn codes() -> impl Iterator<Item = &'static str> {
    EMOJI_TABLE.iter().map(|(key, _)| *key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_and_includes_parens() {
        assert_eq!(lookup("(shrug)"), Some("¯\\_(ツ)_/¯"));
        assert_eq!(lookup("shrug"), None);
        assert_eq!(lookup("(SHRUG)"), None);
    }

    #[test]
    fn codes_are_unique_and_parenthesized() {
        let all: Vec<_> = codes().collect();
        for code in &all {
            assert!(code.starts_with('(') && code.ends_with(')'), "{code}");
        }
        let mut deduped = all.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), all.len());
    }
}
