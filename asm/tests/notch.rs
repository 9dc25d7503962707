use std::path::Path;

use arch::reg::Reg::*;
use ncasm::{ind, off, parser, Library, Linker, Registry};

const NOTCH: &str = "
;Notch's examples
;Should compile fine, by default

;Try some basic stuff
		SET A, 0x30				; 7c01 0030
		SET [0x1000], 0x20		; 7de1 1000 0020
		SUB A, [0x1000]			; 7803 1000
		IFN A, 0x10				; c00d
		SET PC, crash         	; 7dc1 001a [*]

;Do a loopy thing
		SET I, 10               ; a861
		SET A, 0x2000           ; 7c01 2000
:loop	SET [0x2000+I], [A]		; 2161 2000
		SUB I, 1				; 8463
		IFN I, 0				; 806d
		SET PC, loop			; 7dc1 000d [*]

;Call a subroutine
		SET X, 0x4				; 9031
		JSR testsub				; 7c10 0018 [*]
		SET PC, crash			; 7dc1 001a [*]

:testsub
		SHL X, 4				; 9037
		SET PC, POP				; 61c1

;Hang forever. X should now be 0x40 if everything went right.
:crash	SET PC, crash			; 7dc1 001a [*]

; Assembler test
		set a, 0xbeef				; Assign 0xbeef to register a
		set [0x1000], a				; Assign memory at 0x1000 to value of register a
		ifn a, [0x1000]				; Compare value of register a to memory at 0x1000 ..
			set PC, end				; .. and jump to end if they don't match

		set i, 0; Init loop counter, for clarity
:nextchar
		ife [data+i]				, 0; If the character is 0 ..
		set PC, end					; .. jump to the end
		set [0x8000+i], [data+i]	; Video ram starts at 0x8000, copy char there
		add i, 1					; Increase loop counter
		set PC, nextchar			; Loop

:data	dat \"Hello world!\", 0; Zero terminated string

:end	sub PC, 1; Freeze the CPU forever
";

fn link(lib: &Library) -> Vec<u16> {
    let mut linker = Linker::new(Registry::new());
    linker.compile(lib, "main").unwrap();
    println!("{}", linker.dump().unwrap());
    linker.finalize().unwrap()
}

fn builder() -> Library {
    let mut lib = Library::new();
    lib.block("main", |b| {
        b.set(A, 0x30)
            .set(ind(0x1000), 0x20)
            .sub(A, ind(0x1000))
            .ifn(A, 0x10)
            .set(PC, "crash");

        b.set(I, 10)
            .set(A, 0x2000)
            .label("loop")
            .set(off(I, 0x2000), ind(A))
            .sub(I, 1)
            .ifn(I, 0)
            .set(PC, "loop");

        b.set(X, 0x4).jsr("testsub").set(PC, "crash");

        b.label("testsub").shl(X, 4).set(PC, POP);

        b.label("crash").set(PC, "crash");

        b.set(A, 0xbeef)
            .set(ind(0x1000), A)
            .ifn(A, ind(0x1000))
            .set(PC, "end");

        b.set(I, 0)
            .label("nextchar")
            .ife(off(I, "data"), 0)
            .set(PC, "end")
            .set(off(I, 0x8000), off(I, "data"))
            .add(I, 1)
            .set(PC, "nextchar");

        b.string("data", "Hello world!\0").label("end").sub(PC, 1);
        Ok(())
    })
    .unwrap();
    lib
}

#[test]
fn text_matches_builder() {
    let text = parser::parse("notch.asm", NOTCH, Path::new(".")).unwrap();
    let from_text = link(&text);
    let from_builder = link(&builder());

    assert_eq!(from_text, from_builder);
    assert_eq!(
        &from_text[..10],
        &[0x7c01, 0x0030, 0x7de1, 0x1000, 0x0020, 0x7803, 0x1000, 0xc00d, 0x7dc1, 0x001a]
    );
}

#[test]
fn text_and_builder_blocks_are_equal() {
    let text = parser::parse("notch.asm", NOTCH, Path::new(".")).unwrap();
    let lib = builder();
    let (text_words, text_labels) = text.blocks["main"].to_machine().unwrap();
    let (words, labels) = lib.blocks["main"].to_machine().unwrap();
    assert_eq!(text_words, words);
    assert_eq!(text_labels, labels);
    assert_eq!(
        labels.keys().collect::<Vec<_>>(),
        vec!["loop", "testsub", "crash", "nextchar", "data", "end"]
    );
}
