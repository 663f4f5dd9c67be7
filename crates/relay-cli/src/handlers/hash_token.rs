//! `hash-token`: print the digest to store in `auth.users[].token_sha256`.

use relay_proxy::digest_token;

pub fn execute(token: &str) {
    println!("{}", digest_token(token));
}
