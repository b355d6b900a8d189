/// A hashtag name together with the id the platform assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagLookup {
    pub query: String,
    pub id: String,
}
