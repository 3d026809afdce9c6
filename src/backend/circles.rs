use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Peer {
    pub name: &'static str,
    pub avatar: &'static str,
    pub streak: u32,
    pub last_activity: &'static str,
}

pub const PEERS: [Peer; 6] = [
    Peer { name: "Alex", avatar: "🧑‍🚀", streak: 12, last_activity: "Just read a story on communication." },
    Peer { name: "Sam", avatar: "🎨", streak: 25, last_activity: "Completed the Time Master Challenge." },
    Peer { name: "Jordan", avatar: "🎸", streak: 5, last_activity: "Found a volunteer opportunity nearby!" },
    Peer { name: "Taylor", avatar: "🧪", streak: 18, last_activity: "Shared their feelings in the mood checker." },
    Peer { name: "Casey", avatar: "🏀", streak: 3, last_activity: "Just started their adventure today." },
    Peer { name: "Riley", avatar: "📚", streak: 31, last_activity: "Is on a roll with their daily streak!" },
];

/// Peers ordered by streak, longest first.
pub fn leaderboard() -> Vec<Peer> {
    let mut peers = PEERS.to_vec();
    peers.sort_by(|a, b| b.streak.cmp(&a.streak));
    peers
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommunicationChallenge {
    pub title: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
}

pub const COMMUNICATION_CHALLENGES: [CommunicationChallenge; 4] = [
    CommunicationChallenge {
        title: "Homework Huddle",
        description: "Chat with a friend about your homework. Ask what they think about an assignment.",
        emoji: "📚",
    },
    CommunicationChallenge {
        title: "Dinner Debrief",
        description: "Share one interesting thing you learned today with your family at dinner.",
        emoji: "💬",
    },
    CommunicationChallenge {
        title: "Compliment Quest",
        description: "Give a genuine compliment to someone today. Notice how it makes them (and you!) feel.",
        emoji: "🏅",
    },
    CommunicationChallenge {
        title: "Active Listener",
        description: "When someone talks to you, try to summarize what they said before you reply. It shows you're really listening!",
        emoji: "⚡",
    },
];
