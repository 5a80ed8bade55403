use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

use heapless::Vec as InlineVec;

pub(crate) fn serialize_slices_as_one<Sl: AsRef<[u8]>, Se: Serializer>(
    slices: &[Sl],
    ser: Se,
) -> Result<Se::Ok, Se::Error> {
    let mut seq = ser.serialize_seq(Some(slices.len()))?;
    slices
        .iter()
        .map(AsRef::as_ref)
        .try_for_each(|b| seq.serialize_element(b))
        .and_then(|()| seq.end())
}

pub(crate) fn deserialize_slices_as_one<
    'de,
    const N: usize,
    const M: usize,
    De: Deserializer<'de>,
>(
    de: De,
) -> Result<[[u8; N]; M], De::Error> {
    let outer = InlineVec::<InlineVec<u8, N>, M>::deserialize(de)?;
    let len = outer.len();
    let mut digest = [[0; N]; M];
    if len != M {
        return Err(De::Error::invalid_length(len, &"every bank of memory"));
    }
    for (dest, src) in digest.iter_mut().zip(outer) {
        if src.len() != N {
            return Err(De::Error::invalid_length(src.len(), &"a full bank of memory"));
        }
        dest.copy_from_slice(&src);
    }
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Banks {
        #[serde(serialize_with = "super::serialize_slices_as_one")]
        #[serde(deserialize_with = "super::deserialize_slices_as_one")]
        data: [[u8; 4]; 2],
    }

    #[test]
    fn banks_round_trip() {
        let banks = Banks {
            data: [[1, 2, 3, 4], [5, 6, 7, 8]],
        };
        let bytes = postcard::to_allocvec(&banks).unwrap();
        let back: Banks = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(banks, back);
    }

    #[derive(Serialize)]
    struct Short {
        data: Vec<Vec<u8>>,
    }

    #[test]
    fn short_bank_is_rejected() {
        let short = Short {
            data: vec![vec![1, 2, 3, 4], vec![5, 6]],
        };
        let bytes = postcard::to_allocvec(&short).unwrap();
        assert!(postcard::from_bytes::<Banks>(&bytes).is_err());
    }
}
