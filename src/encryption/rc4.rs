// The RC4 stream cipher. It is simple enough that pulling in a crate for it is not worth it.
#[derive(Clone)]
pub struct Rc4 {
    initial_state: [u8; 256],
}

impl Rc4 {
    /// Runs the key schedule. Keys are 1 to 256 bytes long.
    pub fn new<Key: AsRef<[u8]>>(key: Key) -> Self {
        let key = key.as_ref();
        assert!(!key.is_empty() && key.len() <= 256);

        let mut initial_state = [0_u8; 256];
        for (i, v) in initial_state.iter_mut().enumerate() {
            *v = i as u8;
        }

        let mut j = 0_u8;
        for i in 0..256 {
            j = j.wrapping_add(initial_state[i]).wrapping_add(key[i % key.len()]);
            initial_state.swap(i, j as usize);
        }

        Self { initial_state }
    }

    /// XORs the keystream into `data`.
    pub fn apply_keystream(&self, data: &mut [u8]) {
        let mut state = self.initial_state;
        let mut i = 0_u8;
        let mut j = 0_u8;
        for byte in data.iter_mut() {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            *byte ^= state[(state[i as usize].wrapping_add(state[j as usize])) as usize];
        }
    }

    pub fn decrypt<Input>(&self, input: Input) -> Vec<u8>
    where
        Input: AsRef<[u8]>,
    {
        let mut output = input.as_ref().to_vec();
        self.apply_keystream(&mut output);
        output
    }

    pub fn encrypt<Input>(&self, input: Input) -> Vec<u8>
    where
        Input: AsRef<[u8]>,
    {
        // Rc4 is symmetric
        self.decrypt(input)
    }
}
