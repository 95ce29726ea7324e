use {
    super::{Error, ErrorKind},
    crate::{
        domain::{
            eth,
            plan::{SignPayload, Signing},
        },
        infra::{aggregator::Postback, blockchain::ChainClient, observe},
    },
};

/// Result of a signature item.
#[derive(Debug, Clone, PartialEq)]
pub enum Signed {
    /// Signing was the terminal action.
    Signature(eth::Bytes),
    /// The signature was delivered and the aggregator answered with this.
    Posted(serde_json::Value),
}

/// Signs payloads and delivers the signatures to the aggregator when the
/// item asks for it.
pub struct SignatureStepHandler<'a> {
    chain: &'a dyn ChainClient,
    postback: &'a dyn Postback,
}

impl<'a> SignatureStepHandler<'a> {
    pub fn new(chain: &'a dyn ChainClient, postback: &'a dyn Postback) -> Self {
        Self { chain, postback }
    }

    /// A signature whose postback fails is dropped. Nothing half signed is
    /// kept around.
    pub async fn execute(&self, signing: &Signing) -> Result<Signed, Error> {
        let signature = match &signing.sign {
            SignPayload::Eip712(data) => self.chain.sign_typed_data(data).await,
            SignPayload::Eip191(message) => self.chain.sign_message(message.as_bytes()).await,
        }
        .map_err(|err| Error::new(ErrorKind::SigningFailed, err))?;
        observe::signature_produced(&signing.sign);

        let Some(post) = &signing.post else {
            return Ok(Signed::Signature(signature));
        };
        let response = self
            .postback
            .post(post, &signature)
            .await
            .map_err(|err| Error::new(ErrorKind::PostbackFailed, err))?;
        observe::postback_sent(post, &response);
        Ok(Signed::Posted(response))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            domain::plan::PostCallback,
            infra::{
                aggregator::{MockPostback, PostbackError},
                blockchain::{self, MockChainClient},
            },
        },
        reqwest::{Method, StatusCode},
        serde_json::json,
    };

    fn typed_data() -> SignPayload {
        SignPayload::Eip712(Box::new(
            serde_json::from_value(json!({
                "domain": { "name": "Marketplace", "version": "1" },
                "types": {
                    "Offer": [{ "name": "price", "type": "uint256" }]
                },
                "primaryType": "Offer",
                "message": { "price": "1000" }
            }))
            .unwrap(),
        ))
    }

    fn callback() -> PostCallback {
        PostCallback {
            endpoint: "order/v4".into(),
            method: Method::POST,
            body: json!({ "order": {} }),
        }
    }

    fn signature() -> eth::Bytes {
        eth::Bytes::from_static(&[0xaa; 65])
    }

    #[tokio::test]
    async fn signs_without_postback() {
        let mut chain = MockChainClient::new();
        chain
            .expect_sign_typed_data()
            .times(1)
            .returning(|_| Ok(signature()));
        let mut postback = MockPostback::new();
        postback.expect_post().times(0);

        let result = SignatureStepHandler::new(&chain, &postback)
            .execute(&Signing {
                sign: typed_data(),
                post: None,
            })
            .await;

        assert_eq!(result, Ok(Signed::Signature(signature())));
    }

    #[tokio::test]
    async fn posts_signature() {
        let mut chain = MockChainClient::new();
        chain
            .expect_sign_message()
            .withf(|message| message.to_vec() == b"hello".to_vec())
            .times(1)
            .returning(|_| Ok(signature()));
        let mut postback = MockPostback::new();
        postback
            .expect_post()
            .withf(|post, sig| *post == callback() && *sig == signature())
            .times(1)
            .returning(|_, _| Ok(json!({ "orderId": "abc" })));

        let result = SignatureStepHandler::new(&chain, &postback)
            .execute(&Signing {
                sign: SignPayload::Eip191("hello".into()),
                post: Some(callback()),
            })
            .await;

        assert_eq!(result, Ok(Signed::Posted(json!({ "orderId": "abc" }))));
    }

    #[tokio::test]
    async fn signing_failure_skips_postback() {
        let mut chain = MockChainClient::new();
        chain
            .expect_sign_typed_data()
            .returning(|_| Err(blockchain::Error::Other(anyhow::anyhow!("rejected"))));
        let mut postback = MockPostback::new();
        postback.expect_post().times(0);

        let err = SignatureStepHandler::new(&chain, &postback)
            .execute(&Signing {
                sign: typed_data(),
                post: Some(callback()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::SigningFailed);
    }

    #[tokio::test]
    async fn rejected_postback() {
        let mut chain = MockChainClient::new();
        chain
            .expect_sign_typed_data()
            .returning(|_| Ok(signature()));
        let mut postback = MockPostback::new();
        postback.expect_post().returning(|_, _| {
            Err(PostbackError::Status {
                code: StatusCode::BAD_REQUEST,
                text: "expired".into(),
            })
        });

        let err = SignatureStepHandler::new(&chain, &postback)
            .execute(&Signing {
                sign: typed_data(),
                post: Some(callback()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::PostbackFailed);
        assert!(err.detail.contains("expired"));
    }
}
