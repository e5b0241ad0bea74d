//! Fuzz-style robustness tests: random program files must never panic a backend.

use avm_loader::runtime::{Instruction, ProgramImage, ProgramLoader};
use avm_loader::{load_machine_from_file, LoaderError};
use rand::Rng;

#[test]
fn fuzz_garbage_files() {
    let mut rng = rand::thread_rng();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.bin");

    for _ in 0..300 {
        let len = rng.gen_range(0..256);
        let bogus: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        std::fs::write(&path, &bogus).unwrap();

        for vm_type in ["go", "test"] {
            let res = load_machine_from_file(&path, true, vm_type);
            assert!(matches!(res, Err(LoaderError::Backend(_))));
        }
        let m = load_machine_from_file(&path, true, "cpp").unwrap();
        assert!(m.hash().is_err());
    }
}

fn random_instruction<R: Rng>(rng: &mut R, len: u64) -> Instruction {
    match rng.gen_range(0..13) {
        0 => Instruction::Nop,
        1 => Instruction::Push(rng.gen()),
        2 => Instruction::Pop,
        3 => Instruction::Dup,
        4 => Instruction::Swap,
        5 => Instruction::Add,
        6 => Instruction::Sub,
        7 => Instruction::Mul,
        8 => Instruction::Jump(rng.gen_range(0..len)),
        9 => Instruction::JumpIf(rng.gen_range(0..len)),
        10 => Instruction::Log,
        11 => Instruction::Halt,
        _ => Instruction::Error,
    }
}

#[test]
fn fuzz_random_programs_agree_across_backends() {
    let mut rng = rand::thread_rng();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("random.bin");

    for _ in 0..100 {
        let len = rng.gen_range(1..40u64);
        let code = (0..len).map(|_| random_instruction(&mut rng, len)).collect();
        ProgramLoader::write_image(&path, &ProgramImage::new(code)).unwrap();

        let mut go = load_machine_from_file(&path, false, "go").unwrap();
        let mut cpp = load_machine_from_file(&path, false, "cpp").unwrap();
        let mut test = load_machine_from_file(&path, false, "test").unwrap();
        for _ in 0..3 {
            let a = go.execute(50).unwrap();
            assert_eq!(a, cpp.execute(50).unwrap());
            assert_eq!(a, test.execute(50).unwrap());
        }
    }
}
