//! Implementations of commonly used traits like
//! [`digest::Digest`](https://crates.io/crates/digest) and
//! [`crypto_mac::Mac`](https://crates.io/crates/crypto-mac).
//!
//! These trait signatures can't report [`Error`](crate::Error), so using them
//! on a finalized [`Hasher`] panics. The resetting variants, and
//! [`digest::Reset`], put the `Hasher` back into a usable state.

pub use crypto_mac;
pub use digest;

use crate::{Hash, Hasher, OutputReader};
use digest::generic_array::{
    typenum::{U32, U64},
    GenericArray,
};

fn finalize_or_panic(hasher: &mut Hasher) -> Hash {
    match Hasher::finalize(hasher) {
        Ok(hash) => hash,
        Err(err) => panic!("{}", err),
    }
}

fn finalize_xof_or_panic(hasher: &mut Hasher) -> OutputReader {
    match Hasher::finalize_xof(hasher) {
        Ok(reader) => reader,
        Err(err) => panic!("{}", err),
    }
}

fn update_or_panic(hasher: &mut Hasher, data: &[u8]) {
    if let Err(err) = Hasher::update(hasher, data) {
        panic!("{}", err);
    }
}

impl digest::BlockInput for Hasher {
    type BlockSize = U64;
}

impl digest::Update for Hasher {
    #[inline]
    fn update(&mut self, data: impl AsRef<[u8]>) {
        update_or_panic(self, data.as_ref());
    }
}

impl digest::Reset for Hasher {
    #[inline]
    fn reset(&mut self) {
        Hasher::reset(self); // the inherent method
    }
}

impl digest::FixedOutput for Hasher {
    type OutputSize = U32;

    #[inline]
    fn finalize_into(mut self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(finalize_or_panic(&mut self).as_bytes());
    }

    #[inline]
    fn finalize_into_reset(&mut self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(finalize_or_panic(self).as_bytes());
        Hasher::reset(self);
    }
}

impl digest::ExtendableOutput for Hasher {
    type Reader = OutputReader;

    #[inline]
    fn finalize_xof(mut self) -> Self::Reader {
        finalize_xof_or_panic(&mut self)
    }

    #[inline]
    fn finalize_xof_reset(&mut self) -> Self::Reader {
        let reader = finalize_xof_or_panic(self);
        Hasher::reset(self);
        reader
    }
}

impl digest::XofReader for OutputReader {
    #[inline]
    fn read(&mut self, buffer: &mut [u8]) {
        self.fill(buffer);
    }
}

impl crypto_mac::NewMac for Hasher {
    type KeySize = U32;

    #[inline]
    fn new(key: &crypto_mac::Key<Self>) -> Self {
        let key_bytes: [u8; 32] = (*key).into();
        Hasher::new_keyed_array(&key_bytes)
    }
}

impl crypto_mac::Mac for Hasher {
    type OutputSize = U32;

    #[inline]
    fn update(&mut self, data: &[u8]) {
        update_or_panic(self, data);
    }

    #[inline]
    fn reset(&mut self) {
        Hasher::reset(self);
    }

    #[inline]
    fn finalize(self) -> crypto_mac::Output<Self> {
        crypto_mac::Output::new(digest::Digest::finalize(self))
    }
}
