//! 本地兜底回复
//!
//! 所有服务商都不可用时，按关键词表匹配固定回复；未命中则从通用鼓励语中随机挑选

use rand::seq::SliceRandom;

/// 关键词分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCategory {
    Greeting,
    Money,
    Business,
    Property,
    Advice,
    Game,
    Market,
    Chapter,
    Thanks,
}

/// 按优先级排列的关键词表
const KEYWORD_TABLE: &[(ReplyCategory, &[&str], &str)] = &[
    (
        ReplyCategory::Greeting,
        &["hello", "hi", "hey"],
        "Well hello there, my good fellow! Ready to make some deals? 🎩💰",
    ),
    (
        ReplyCategory::Money,
        &["money", "rich", "wealth"],
        "Ah, talking about money! Remember, it's not just about having it, but knowing how to use it wisely! The key is to make your money work for you! 💸📈",
    ),
    (
        ReplyCategory::Business,
        &["business", "invest", "entrepreneur"],
        "Excellent! Business is my specialty! Remember: diversify your investments, never put all your eggs in one basket, and always do your research! 📊💼",
    ),
    (
        ReplyCategory::Property,
        &["property", "real estate"],
        "Ah, real estate! Location, location, location! That's the golden rule. Buy low, improve the property, and watch its value soar! 🏠🏦",
    ),
    (
        ReplyCategory::Advice,
        &["advice", "help"],
        "Here's some timeless advice: Save before you spend, invest in yourself first, and remember - compound interest is the eighth wonder of the world! ⏰💎",
    ),
    (
        ReplyCategory::Game,
        &["monopoly", "game"],
        "Ah, the game that bears my likeness! It teaches valuable lessons about strategy, negotiation, and financial management. Pass GO and collect wisdom! 🎲🎩",
    ),
    (
        ReplyCategory::Market,
        &["stock", "market"],
        "The stock market! A thrilling game of strategy and patience. Buy quality companies, hold for the long term, and don't let emotions drive your decisions! 📈🎯",
    ),
    (
        ReplyCategory::Chapter,
        &["ieee", "engineering"],
        "Ah, IEEE! A capital organization for engineers! Technology and innovation drive the future of business. Invest in knowledge, my friend! 🎯💼",
    ),
    (
        ReplyCategory::Thanks,
        &["thank", "thanks"],
        "You're most welcome, my enterprising friend! Remember, knowledge is the best investment you can make! 🌟💼",
    ),
];

/// 未命中关键词时的通用回复池
pub const GENERIC_REPLIES: &[&str] = &[
    "Fascinating! Tell me more about your entrepreneurial spirit! In my experience, the best opportunities come to those who are prepared! 💼✨",
    "Splendid! You've got the mind of a true businessperson! Keep that innovative thinking flowing! 🌟🎩",
    "Marvelous! That's exactly the kind of forward-thinking that builds empires! What's your next move? 🏰📊",
    "Capital idea! In business, timing and preparation are everything! How can I help you strategize? ⏰💰",
    "Excellent point! Success favors the prepared mind, and you're clearly thinking like a winner! 🎯🏆",
];

/// 兜底回复生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    pub fn new() -> Self {
        Self
    }

    /// 子串匹配，返回第一个命中的分类
    pub fn classify(&self, user_message: &str) -> Option<ReplyCategory> {
        let message = user_message.to_lowercase();
        KEYWORD_TABLE
            .iter()
            .find(|(_, keywords, _)| keywords.iter().any(|k| message.contains(k)))
            .map(|(category, _, _)| *category)
    }

    /// 分类对应的固定回复
    pub fn reply_for(category: ReplyCategory) -> &'static str {
        KEYWORD_TABLE
            .iter()
            .find(|(c, _, _)| *c == category)
            .map(|(_, _, reply)| *reply)
            .unwrap_or(GENERIC_REPLIES[0])
    }

    /// 生成兜底回复
    pub fn respond(&self, user_message: &str) -> String {
        match self.classify(user_message) {
            Some(category) => Self::reply_for(category).to_string(),
            None => GENERIC_REPLIES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(GENERIC_REPLIES[0])
                .to_string(),
        }
    }
}
