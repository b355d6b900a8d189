pub mod hashtag;
