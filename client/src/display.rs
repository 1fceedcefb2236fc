//! One-line rendering of server notifications for the terminal

use shared::ServerMessage;

pub fn render(message: &ServerMessage) -> String {
    match message {
        ServerMessage::Info { message } => format!("* {}", message),
        ServerMessage::Created { room } => format!("created room {}", room),
        ServerMessage::Joined { room } => format!("joined room {}", room),
        ServerMessage::Rooms { rooms } if rooms.is_empty() => "rooms: (none yet)".to_string(),
        ServerMessage::Rooms { rooms } => format!("rooms: {}", rooms.join(", ")),
        ServerMessage::Start { word } => {
            format!("round started! make words from: {}", word.to_uppercase())
        }
        ServerMessage::Score { scores } => format!("score: {}", pairs(scores)),
        ServerMessage::End { message } => message.clone(),
        ServerMessage::Table { table } if table.is_empty() => {
            "leaderboard: (no wins yet)".to_string()
        }
        ServerMessage::Table { table } => format!("leaderboard: {}", pairs(table)),
        ServerMessage::Registration { accepted: true } => "registration ok".to_string(),
        ServerMessage::Registration { accepted: false } => {
            "registration refused: that name is taken with a different password".to_string()
        }
    }
}

fn pairs(entries: &[(String, u32)]) -> String {
    entries
        .iter()
        .map(|(name, count)| format!("{} {}", name, count))
        .collect::<Vec<_>>()
        .join(", ")
}
