//! Auction bids.
//!
//! A bid is a small signed statement ("I will pay up to `max_price` per
//! unit for `currency` in auction `auction_id` run by `auction_key`") that
//! travels inside a payment note. It is signed over `"aB" ‖ canonical(bid)`.

use rmpv::Value;
use serde::{Deserialize, Serialize};

use crate::config::BID_TAG;
use crate::crypto::{sign_tagged, verify_tagged, Address, Keypair, Signature};
use crate::encoding::msgpack::as_bin;
use crate::encoding::{self, CanonicalDecode, CanonicalEncode, MapBuilder, MapReader};
use crate::error::EncodingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: Address,
    pub currency: u64,
    pub max_price: u64,
    pub bid_id: u64,
    pub auction_key: Address,
    pub auction_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBid {
    pub bid: Bid,
    pub signature: Signature,
}

impl Bid {
    pub fn sign(&self, keypair: &Keypair) -> SignedBid {
        SignedBid {
            bid: self.clone(),
            signature: sign_tagged(keypair, BID_TAG, &encoding::encode(self)),
        }
    }
}

impl SignedBid {
    /// The signature verifies for the bidder.
    pub fn verify(&self) -> bool {
        verify_tagged(
            &self.bid.bidder,
            BID_TAG,
            &encoding::encode(&self.bid),
            &self.signature,
        )
    }
}

impl CanonicalEncode for Bid {
    fn to_msgpack(&self) -> Value {
        MapBuilder::new()
            .uint("aid", self.auction_id)
            .address("auc", &self.auction_key)
            .address("bidder", &self.bidder)
            .uint("cur", self.currency)
            .uint("id", self.bid_id)
            .uint("price", self.max_price)
            .build()
    }
}

impl CanonicalDecode for Bid {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError> {
        let mut r = MapReader::new(value, "bid")?;
        let bid = Self {
            bidder: r.address("bidder")?,
            currency: r.uint("cur")?,
            max_price: r.uint("price")?,
            bid_id: r.uint("id")?,
            auction_key: r.address("auc")?,
            auction_id: r.uint("aid")?,
        };
        r.finish()?;
        Ok(bid)
    }
}

impl CanonicalEncode for SignedBid {
    fn to_msgpack(&self) -> Value {
        MapBuilder::new()
            .value("bid", self.bid.to_msgpack())
            .bytes("sig", self.signature.as_bytes())
            .build()
    }
}

impl CanonicalDecode for SignedBid {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError> {
        let mut r = MapReader::new(value, "signed bid")?;
        let bid = r
            .take("bid")
            .ok_or(EncodingError::MissingField("bid"))
            .and_then(Bid::from_msgpack)?;
        let raw = as_bin("sig", r.take("sig").ok_or(EncodingError::MissingField("sig"))?)?;
        let signature = Signature::try_from_slice(raw).map_err(|_| EncodingError::InvalidLength {
            field: "sig".to_string(),
            expected: 64,
            actual: raw.len(),
        })?;
        r.finish()?;
        Ok(Self { bid, signature })
    }
}
