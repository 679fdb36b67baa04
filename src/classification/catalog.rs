//! Built-in rule catalogs. These are the default tables loaded when the user configuration
//! doesn't replace them. Entries are matched in the order listed here, so more specific
//! rules (ones with a title or path pattern) are kept next to the general rule they refine.

use super::{
    category::Category::{Neutral, Productive, Unproductive},
    rules::{RuleSpec, RuleTableSpec},
};

pub fn app_rules() -> RuleTableSpec {
    RuleTableSpec::new(vec![
        // Editors and IDEs
        RuleSpec::regex(
            "^(code|code - insiders|codium|vscodium|cursor|zed)$",
            Productive,
        ),
        RuleSpec::regex(
            "^(idea|idea64|pycharm|pycharm64|webstorm|goland|clion|rider|rustrover|studio64)$",
            Productive,
        ),
        RuleSpec::regex(
            "^(n?vim|gvim|emacs|helix|hx|sublime_text|xcode)$",
            Productive,
        ),
        // Terminals
        RuleSpec::regex(
            "^(alacritty|kitty|wezterm(-gui)?|gnome-terminal(-server)?|konsole|foot|iterm2|terminal|windowsterminal|powershell|pwsh|cmd)$",
            Productive,
        ),
        // Documents, design and dev tools
        RuleSpec::regex(
            "^(winword|excel|powerpnt|onenote|soffice.*|libreoffice.*)$",
            Productive,
        ),
        RuleSpec::regex("^(obsidian|notion|logseq|joplin)$", Productive)
            .with_weight(0.9),
        RuleSpec::regex("^(figma|figma_agent|inkscape|gimp|blender)$", Productive),
        RuleSpec::regex("^(postman|insomnia|dbeaver|docker desktop)$", Productive),
        // Browsers are neutral: what they show decides
        RuleSpec::regex(
            r"^(chrome|google-chrome|chromium|firefox|msedge|brave|safari|arc|opera|vivaldi)(\.|-|$)",
            Neutral,
        ),
        // Communication
        RuleSpec::exact("slack", Productive)
            .with_secondary("huddle")
            .with_weight(0.8),
        RuleSpec::exact("slack", Neutral).with_weight(0.6),
        RuleSpec::regex("^(teams|ms-teams|zoom|zoom.us)$", Productive)
            .with_weight(0.7),
        RuleSpec::regex("^(thunderbird|outlook|mail)$", Neutral)
            .with_weight(0.6),
        RuleSpec::exact("discord", Unproductive).with_weight(0.2),
        RuleSpec::regex("^(telegram|telegram-desktop|whatsapp|signal)$", Neutral)
            .with_weight(0.4),
        // Media and games
        RuleSpec::regex("^(vlc|mpv)$", Productive)
            .with_secondary("lecture|tutorial|course|talk")
            .with_weight(0.7),
        RuleSpec::regex("^(vlc|mpv)$", Unproductive),
        RuleSpec::exact("spotify", Neutral).with_weight(0.4),
        RuleSpec::regex(
            "^(steam|steamwebhelper|epicgameslauncher|battle.net|lutris)$",
            Unproductive,
        ),
    ])
}

pub fn url_rules() -> RuleTableSpec {
    RuleTableSpec::new(vec![
        // Code hosting and documentation
        RuleSpec::exact("github.com", Productive),
        RuleSpec::exact("gitlab.com", Productive),
        RuleSpec::exact("bitbucket.org", Productive),
        RuleSpec::exact("stackoverflow.com", Productive),
        RuleSpec::regex(r"(^|\.)stackexchange\.com$", Productive),
        RuleSpec::exact("docs.rs", Productive),
        RuleSpec::exact("crates.io", Productive),
        RuleSpec::exact("rust-lang.org", Productive),
        RuleSpec::exact("developer.mozilla.org", Productive),
        RuleSpec::exact("wikipedia.org", Productive).with_weight(0.7),
        // Work tools
        RuleSpec::exact("docs.google.com", Productive),
        RuleSpec::exact("notion.so", Productive).with_weight(0.9),
        RuleSpec::exact("figma.com", Productive),
        RuleSpec::exact("atlassian.net", Productive),
        RuleSpec::exact("linear.app", Productive),
        RuleSpec::exact("mail.google.com", Neutral).with_weight(0.6),
        RuleSpec::exact("outlook.office.com", Neutral)
            .with_weight(0.6),
        RuleSpec::exact("linkedin.com", Neutral).with_weight(0.4),
        RuleSpec::exact("news.ycombinator.com", Neutral)
            .with_weight(0.4),
        // Entertainment, with the occasional useful corner
        RuleSpec::exact("youtube.com", Productive)
            .with_secondary(r"^/results\?search_query=.*(tutorial|lecture|course)")
            .with_weight(0.6),
        RuleSpec::exact("youtube.com", Unproductive),
        RuleSpec::exact("reddit.com", Productive)
            .with_secondary("^/r/(rust|programming|learnprogramming)(/|$)")
            .with_weight(0.6),
        RuleSpec::exact("reddit.com", Unproductive),
        RuleSpec::regex(
            r"^(twitter\.com|x\.com|facebook\.com|instagram\.com|tiktok\.com)$",
            Unproductive,
        ),
        RuleSpec::regex(
            r"^(netflix\.com|twitch\.tv|primevideo\.com|disneyplus\.com)$",
            Unproductive,
        ),
    ])
}
